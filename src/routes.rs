//! Client route table and auth gating.
//!
//! Paths resolve against a fixed table of patterns. Literal segments win
//! over `:param` segments, so `/staff/timings` never reaches `/staff/:id`.
//! Protected pages need a live session; without one they redirect to
//! `/login`, and `/login` itself bounces a signed-in user to `/dashboard`.

use std::collections::BTreeMap;

use crate::session::SessionStore;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_AFTER_LOGIN: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login,
    Dashboard,
    Patients,
    PatientDetail,
    Doctors,
    Staff,
    StaffDetail,
    StaffTimings,
    StaffLeaves,
    Appointments,
    AppointmentDetail,
    Prescriptions,
    PrescriptionDetail,
    Inventory,
    InventoryItem,
    InventoryTransactions,
    Rooms,
    RoomDetail,
    Users,
    UserDetail,
    ItemRequirements,
    StaffRequirements,
    RoomRequirements,
    ItemFulfillments,
    StaffFulfillments,
    RoomFulfillments,
    Settings,
    About,
    NotFound,
}

impl Page {
    /// Pages reachable without signing in.
    pub fn is_public(self) -> bool {
        matches!(self, Self::Home | Self::Login | Self::About | Self::NotFound)
    }
}

/// Pattern → page. Order does not matter; specificity decides.
const ROUTES: &[(&str, Page)] = &[
    ("/", Page::Home),
    ("/login", Page::Login),
    ("/dashboard", Page::Dashboard),
    ("/patients", Page::Patients),
    ("/patients/:id", Page::PatientDetail),
    ("/doctors", Page::Doctors),
    ("/staff", Page::Staff),
    ("/staff/:id", Page::StaffDetail),
    ("/staff/timings", Page::StaffTimings),
    ("/staff/leaves", Page::StaffLeaves),
    ("/appointments", Page::Appointments),
    ("/appointments/:id", Page::AppointmentDetail),
    ("/prescriptions", Page::Prescriptions),
    ("/prescriptions/:id", Page::PrescriptionDetail),
    ("/inventory", Page::Inventory),
    ("/inventory/items/:name", Page::InventoryItem),
    ("/inventory/transactions", Page::InventoryTransactions),
    ("/rooms", Page::Rooms),
    ("/rooms/:id", Page::RoomDetail),
    ("/users", Page::Users),
    ("/users/:id", Page::UserDetail),
    ("/requirements/items", Page::ItemRequirements),
    ("/requirements/staff", Page::StaffRequirements),
    ("/requirements/rooms", Page::RoomRequirements),
    ("/fulfillments/items", Page::ItemFulfillments),
    ("/fulfillments/staff", Page::StaffFulfillments),
    ("/fulfillments/rooms", Page::RoomFulfillments),
    ("/settings", Page::Settings),
    ("/about", Page::About),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub page: Page,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(RouteMatch),
    Redirect(&'static str),
}

fn segments(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Literal segments count for specificity; a parameter matches anything.
fn match_pattern(pattern: &str, parts: &[&str]) -> Option<(usize, BTreeMap<String, String>)> {
    let pattern = segments(pattern);
    if pattern.len() != parts.len() {
        return None;
    }
    let mut literals = 0;
    let mut params = BTreeMap::new();
    for (want, got) in pattern.iter().zip(parts) {
        if let Some(name) = want.strip_prefix(':') {
            params.insert(name.to_string(), (*got).to_string());
        } else if want == got {
            literals += 1;
        } else {
            return None;
        }
    }
    Some((literals, params))
}

/// Match `path` against the route table, ignoring auth.
pub fn match_path(path: &str) -> RouteMatch {
    let parts = segments(path);
    ROUTES
        .iter()
        .filter_map(|(pattern, page)| {
            match_pattern(pattern, &parts).map(|(score, params)| (score, *page, params))
        })
        .max_by_key(|(score, _, _)| *score)
        .map(|(_, page, params)| RouteMatch { page, params })
        .unwrap_or(RouteMatch {
            page: Page::NotFound,
            params: BTreeMap::new(),
        })
}

/// Match `path` and apply the session gate.
pub fn resolve(path: &str, session: &SessionStore) -> Resolution {
    let matched = match_path(path);
    let signed_in = session.current().is_some();
    if matched.page == Page::Login && signed_in {
        return Resolution::Redirect(HOME_AFTER_LOGIN);
    }
    if !matched.page.is_public() && !signed_in {
        tracing::debug!(path, "Protected page without session, redirecting");
        return Resolution::Redirect(LOGIN_PATH);
    }
    Resolution::Render(matched)
}
