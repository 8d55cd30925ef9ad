use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::{LeaveStatus, Role};
use super::user::{require_password, User};
use crate::error::ClientError;
use crate::validation::{require_email, require_range, require_text, Validate};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialty {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub name: String,
}

/// One weekly working window. `weekday` is 0 (Sunday) through 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffTiming {
    #[serde(default, deserialize_with = "super::opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "super::opt_id")]
    pub staff_id: Option<String>,
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leave {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(default, deserialize_with = "super::opt_id")]
    pub staff_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: Option<LeaveStatus>,
}

impl Leave {
    /// Whether `day` falls inside the leave (inclusive on both ends).
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub user: Option<User>,
    pub role: Role,
    #[serde(default)]
    pub specialties: Vec<Specialty>,
    #[serde(default)]
    pub timings: Vec<StaffTiming>,
    #[serde(default)]
    pub leaves: Vec<Leave>,
}

impl Staff {
    pub fn display_name(&self) -> String {
        self.user
            .as_ref()
            .map(User::display_name)
            .unwrap_or_else(|| format!("Staff #{}", self.id))
    }

    pub fn has_specialty(&self, specialty_id: &str) -> bool {
        self.specialties.iter().any(|s| s.id == specialty_id)
    }
}

/// One row of the timing or leave board: a staff member with the windows
/// that matched the board filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSchedule {
    #[serde(deserialize_with = "super::id")]
    pub staff_id: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub timings: Vec<StaffTiming>,
    #[serde(default)]
    pub leaves: Vec<Leave>,
}

/// Body of `POST /staff`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Validate for NewStaff {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("name", &self.name)?;
        require_email("email", &self.email)?;
        require_password("password", &self.password)
    }
}

/// Body of `POST /staff/doctors`: promotes a staff member to doctor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub staff_id: String,
    pub specialities: Vec<String>,
}

impl Validate for NewDoctor {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("staffId", &self.staff_id)?;
        if self.specialities.iter().all(|s| s.trim().is_empty()) {
            return Err(ClientError::validation(
                "specialities",
                "at least one speciality is required",
            ));
        }
        Ok(())
    }
}

/// Body of `POST /staff/:id/timings`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTiming {
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Validate for NewTiming {
    fn validate(&self) -> Result<(), ClientError> {
        if self.weekday > 6 {
            return Err(ClientError::validation("weekday", "weekday must be 0-6"));
        }
        if self.end_time <= self.start_time {
            return Err(ClientError::validation(
                "endTime",
                "end time must be after start time",
            ));
        }
        Ok(())
    }
}

/// Body of `POST /staff/leaves`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub staff_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl Validate for LeaveRequest {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("staffId", &self.staff_id)?;
        require_text("reason", &self.reason)?;
        require_range("endDate", &self.start_date, &self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn staff_with_specialties() {
        let staff: Staff = serde_json::from_str(
            r#"{"id":4,"role":"Doctor","specialties":[{"id":1,"name":"Cardiology"}],
                "timings":[{"weekday":1,"startTime":"09:00:00","endTime":"13:00:00"}]}"#,
        )
        .unwrap();
        assert!(staff.has_specialty("1"));
        assert!(!staff.has_specialty("2"));
        assert_eq!(staff.timings[0].weekday, 1);
        assert!(staff.leaves.is_empty());
    }

    #[test]
    fn leave_covers_inclusive_range() {
        let leave = Leave {
            id: "1".into(),
            staff_id: None,
            start_date: date("2025-03-01"),
            end_date: date("2025-03-03"),
            reason: None,
            status: Some(LeaveStatus::Approved),
        };
        assert!(leave.covers(date("2025-03-01")));
        assert!(leave.covers(date("2025-03-03")));
        assert!(!leave.covers(date("2025-03-04")));
    }

    #[test]
    fn leave_request_rejects_inverted_range() {
        let req = LeaveRequest {
            staff_id: "4".into(),
            start_date: date("2025-03-05"),
            end_date: date("2025-03-01"),
            reason: "conference".into(),
        };
        assert!(matches!(
            req.validate(),
            Err(ClientError::Validation { field, .. }) if field == "endDate"
        ));
    }

    #[test]
    fn timing_must_end_after_start() {
        let timing = NewTiming {
            weekday: 2,
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        assert!(timing.validate().is_err());
    }

    #[test]
    fn short_password_rejected() {
        let staff = NewStaff {
            name: "Kim".into(),
            email: "kim@ward.org".into(),
            password: "short".into(),
            role: Role::Nurse,
            phone: None,
            department: None,
        };
        assert!(staff.validate().is_err());
    }

    #[test]
    fn board_row_defaults_missing_lists() {
        let row: StaffSchedule = serde_json::from_str(
            r#"{"staffId":8,"name":"Kim Lee","role":"nurse",
                "leaves":[{"id":"l1","startDate":"2025-03-01","endDate":"2025-03-02","status":"pending"}]}"#,
        )
        .unwrap();
        assert_eq!(row.staff_id, "8");
        assert!(row.timings.is_empty());
        assert_eq!(row.leaves[0].status, Some(LeaveStatus::Pending));
    }
}
