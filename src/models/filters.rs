use chrono::NaiveDate;
use serde::Serialize;

use super::appointment::Appointment;
use super::enums::{
    AppointmentStatus, InventoryKind, LeaveStatus, RoomStatus, Role, Timeframe, TransactionType,
};
use crate::http::QueryParams;

/// A list filter: serialized into the query key and rendered as query-string
/// parameters. Unset fields are omitted from both.
pub trait ListFilter: Serialize {
    fn to_params(&self) -> QueryParams;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    pub timeframe: Timeframe,
}

impl ListFilter for AppointmentFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("doctorId", self.doctor_id.as_ref())
            .opt("status", self.status.as_ref())
            .opt("search", self.search.as_ref())
            .opt("from", self.from.as_ref())
            .add("timeframe", &self.timeframe)
    }
}

impl AppointmentFilter {
    /// Row-level check applied after the fetch, so a lenient backend never
    /// shows rows outside the selected status or doctor.
    pub fn matches(&self, appt: &Appointment) -> bool {
        let status_ok = self.status.as_ref().map_or(true, |s| &appt.status == s);
        let doctor_ok = self
            .doctor_id
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or(true, |d| appt.doctor_id == d);
        status_ok && doctor_ok
    }
}

/// Patient list filter. Ages are clamped the way the filter panel does it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
}

/// Upper bound accepted for the age filter.
pub const MAX_FILTER_AGE: u32 = 150;

impl PatientFilter {
    /// Clamp to `0 <= min <= max <= 150`. Swapped bounds collapse onto `max`.
    pub fn with_age_range(mut self, min: u32, max: u32) -> Self {
        let min = min.min(max);
        let max = max.max(min).min(MAX_FILTER_AGE);
        self.min_age = Some(min.min(max));
        self.max_age = Some(max);
        self
    }
}

impl ListFilter for PatientFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("search", self.search.as_ref())
            .opt("gender", self.gender.as_ref())
            .opt("minAge", self.min_age.as_ref())
            .opt("maxAge", self.max_age.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty_id: Option<String>,
}

impl ListFilter for StaffFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("search", self.search.as_ref())
            .opt("role", self.role.as_ref())
            .opt("specialtyId", self.specialty_id.as_ref())
    }
}

/// Filter for the weekly timing board and the leave board.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeaveStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl ListFilter for ScheduleFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("role", self.role.as_ref())
            .opt("specialtyId", self.specialty_id.as_ref())
            .opt("weekday", self.weekday.as_ref())
            .opt("status", self.status.as_ref())
            .opt("from", self.from.as_ref())
            .opt("to", self.to.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_patient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_doctor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl ListFilter for PrescriptionFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("searchPatient", self.search_patient.as_ref())
            .opt("searchDoctor", self.search_doctor.as_ref())
            .opt("from", self.from.as_ref())
            .opt("to", self.to.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<InventoryKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_before: Option<NaiveDate>,
}

impl ListFilter for InventoryFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("type", self.kind.as_ref())
            .opt("lowStock", self.low_stock.as_ref())
            .opt("expiryBefore", self.expiry_before.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl ListFilter for TransactionFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("itemId", self.item_id.as_ref())
            .opt("type", self.kind.as_ref())
            .opt("from", self.from.as_ref())
            .opt("to", self.to.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
}

impl ListFilter for RoomFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("type", self.room_type.as_ref())
            .opt("status", self.status.as_ref())
            .opt("floor", self.floor.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_like: Option<String>,
}

impl ListFilter for UserFilter {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("role", self.role.as_ref())
            .opt("type", self.user_type.as_ref())
            .opt("emailLike", self.email_like.as_ref())
    }
}
