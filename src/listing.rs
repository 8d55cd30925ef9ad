//! Table helpers shared by every list screen: page windows, the
//! loading/error/empty/rows view state and the client-side filter matchers.

use crate::error::ClientError;

// ═══════════════════════════════════════════════════════════
// Pagination
// ═══════════════════════════════════════════════════════════

/// Bounds of one table page. Pages are 1-based.
///
/// `page` is clamped to `1..=page_count`, so no window beyond the last page
/// can be built. A `page_size` of 0 is treated as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub total: usize,
    pub page_size: usize,
    pub page: usize,
    pub page_count: usize,
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn new(total: usize, page_size: usize, page: usize) -> Self {
        let page_size = page_size.max(1);
        let page_count = total.div_ceil(page_size).max(1);
        let page = page.clamp(1, page_count);
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(total);
        Self {
            total,
            page_size,
            page,
            page_count,
            start,
            end,
        }
    }

    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let end = self.end.min(rows.len());
        let start = self.start.min(end);
        &rows[start..end]
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    pub fn next(&self) -> Self {
        Self::new(self.total, self.page_size, self.page + 1)
    }

    pub fn prev(&self) -> Self {
        Self::new(self.total, self.page_size, self.page.saturating_sub(1))
    }

    /// Footer text, e.g. `11-20 of 42`.
    pub fn label(&self) -> String {
        if self.total == 0 {
            "No records".to_string()
        } else {
            format!("{}-{} of {}", self.start + 1, self.end, self.total)
        }
    }
}

// ═══════════════════════════════════════════════════════════
// View state
// ═══════════════════════════════════════════════════════════

/// Which table a list belongs to; picks its "no records" text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Patients,
    Appointments,
    Prescriptions,
    Doctors,
    Staff,
    StaffTimings,
    StaffLeaves,
    Inventory,
    StockLots,
    Transactions,
    Rooms,
    Users,
    Requirements,
    Fulfillments,
}

impl Listing {
    pub fn empty_message(self) -> &'static str {
        match self {
            Self::Patients => "No patients found matching your filters.",
            Self::Appointments => "No appointments found.",
            Self::Prescriptions => "No prescriptions found.",
            Self::Doctors => "No doctors found",
            Self::Staff => "No staff found",
            Self::StaffTimings => "No timings found",
            Self::StaffLeaves => "No leave records found",
            Self::Inventory => "No items",
            Self::StockLots => "No stock entries found for this item",
            Self::Transactions => "No records",
            Self::Rooms => "No rooms found",
            Self::Users => "No users found",
            Self::Requirements => "No requirements found",
            Self::Fulfillments => "No fulfillments yet.",
        }
    }
}

/// What a list screen renders for one query outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<T> {
    Loading,
    Error(String),
    Empty(String),
    Rows { rows: Vec<T>, window: PageWindow },
}

impl<T: Clone> ListView<T> {
    /// Map a finished query into a view of page `page`.
    pub fn from_result(
        result: Result<&[T], &ClientError>,
        listing: Listing,
        page_size: usize,
        page: usize,
    ) -> Self {
        match result {
            Err(e) => Self::Error(e.user_message()),
            Ok([]) => Self::Empty(listing.empty_message().to_string()),
            Ok(rows) => {
                let window = PageWindow::new(rows.len(), page_size, page);
                Self::Rows {
                    rows: window.slice(rows).to_vec(),
                    window,
                }
            }
        }
    }
}

impl<T> ListView<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Inline text shown instead of a table, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error(msg) | Self::Empty(msg) => Some(msg),
            _ => None,
        }
    }
}

// ── filters ──

/// Case-insensitive substring match over several fields. A blank needle
/// matches every row.
pub fn matches_text<S: AsRef<str>>(haystacks: &[S], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    needle.is_empty()
        || haystacks
            .iter()
            .any(|h| h.as_ref().to_lowercase().contains(&needle))
}

/// Select-box match: `"all"` or an empty choice matches every value.
pub fn matches_choice(value: &str, choice: &str) -> bool {
    let choice = choice.trim();
    choice.is_empty() || choice.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case(choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_cover_every_reachable_page() {
        for total in [0usize, 1, 9, 10, 11, 42] {
            for size in [1usize, 3, 10] {
                let last = PageWindow::new(total, size, 1).page_count;
                assert_eq!(last, total.div_ceil(size).max(1));
                let mut covered = 0;
                for page in 1..=last {
                    let w = PageWindow::new(total, size, page);
                    assert_eq!(w.start, (page - 1) * size);
                    assert_eq!(w.end, (w.start + size).min(total));
                    covered += w.end - w.start;
                }
                assert_eq!(covered, total);
            }
        }
    }

    #[test]
    fn page_beyond_last_is_clamped() {
        let w = PageWindow::new(25, 10, 9);
        assert_eq!((w.page, w.start, w.end), (3, 20, 25));
        assert!(!w.has_next());
        assert_eq!(PageWindow::new(25, 10, 0).page, 1);
    }

    #[test]
    fn zero_page_size_is_one() {
        let w = PageWindow::new(3, 0, 2);
        assert_eq!((w.page_size, w.start, w.end), (1, 1, 2));
    }

    #[test]
    fn footer_label() {
        assert_eq!(PageWindow::new(42, 10, 2).label(), "11-20 of 42");
        assert_eq!(PageWindow::new(0, 10, 1).label(), "No records");
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let w = PageWindow::new(15, 10, 1);
        assert!(!w.has_prev());
        let w = w.next();
        assert_eq!(w.page, 2);
        assert_eq!(w.next().page, 2);
        assert_eq!(w.prev().prev().page, 1);
    }

    #[test]
    fn empty_result_shows_no_records_message() {
        let rows: Vec<u32> = vec![];
        let view = ListView::from_result(Ok(&rows[..]), Listing::Appointments, 10, 1);
        assert_eq!(view, ListView::Empty("No appointments found.".into()));
        assert_eq!(view.message(), Some("No appointments found."));
    }

    #[test]
    fn rows_are_sliced_to_the_page() {
        let rows: Vec<u32> = (1..=12).collect();
        let view = ListView::from_result(Ok(&rows[..]), Listing::Transactions, 10, 2);
        match view {
            ListView::Rows { rows, window } => {
                assert_eq!(rows, vec![11, 12]);
                assert_eq!(window.label(), "11-12 of 12");
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn error_uses_user_message() {
        let err = ClientError::Network(String::new());
        let view = ListView::<u32>::from_result(Err(&err), Listing::Rooms, 10, 1);
        assert_eq!(view, ListView::Error("Network error".into()));
    }

    #[test]
    fn text_and_choice_matchers() {
        assert!(matches_text(&["Ana Ruiz", "ana@ward.org"], "  RUIZ "));
        assert!(matches_text(&["Ana Ruiz"], ""));
        assert!(!matches_text(&["Ana Ruiz"], "lena"));
        assert!(matches_choice("scheduled", "all"));
        assert!(matches_choice("scheduled", ""));
        assert!(matches_choice("Scheduled", "scheduled"));
        assert!(!matches_choice("cancelled", "scheduled"));
    }
}
