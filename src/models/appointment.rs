use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use crate::error::ClientError;
use crate::validation::{require_text, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(deserialize_with = "super::id")]
    pub patient_id: String,
    #[serde(deserialize_with = "super::id")]
    pub doctor_id: String,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub issues: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A status change a caller can request. Each maps to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Confirm,
    CheckIn,
    Complete,
    Cancel,
}

impl AppointmentAction {
    /// Path segment under `/appointments/:id/`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::CheckIn => "check-in",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }

    pub fn target(self) -> AppointmentStatus {
        match self {
            Self::Confirm => AppointmentStatus::Confirmed,
            Self::CheckIn => AppointmentStatus::CheckedIn,
            Self::Complete => AppointmentStatus::Completed,
            Self::Cancel => AppointmentStatus::Cancelled,
        }
    }
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// scheduled → confirmed → checked-in → completed; any open status may be
    /// cancelled; scheduled/confirmed/rescheduled may be rescheduled.
    pub fn can_transition_to(&self, next: &AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match (self, next) {
            (Scheduled | Rescheduled, Confirmed) => true,
            (Confirmed, CheckedIn) => true,
            (CheckedIn, Completed) => true,
            (Scheduled | Confirmed | Rescheduled, Rescheduled) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn ensure_transition(&self, next: &AppointmentStatus) -> Result<(), ClientError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ClientError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

/// Body of `POST /appointments`. The backend picks the doctor when only a
/// speciality is given.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<String>,
}

impl Validate for NewAppointment {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("patientId", &self.patient_id)?;
        let has_doctor = self.doctor_id.as_deref().is_some_and(|d| !d.trim().is_empty());
        let has_speciality = self.speciality.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_doctor && !has_speciality {
            return Err(ClientError::validation(
                "doctorId",
                "choose a doctor or a speciality",
            ));
        }
        Ok(())
    }
}

/// Body of `POST /appointments/:id/reschedule`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reschedule {
    pub start_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
}

impl Validate for Reschedule {
    fn validate(&self) -> Result<(), ClientError> {
        match self.end_at {
            Some(end) if end <= self.start_at => Err(ClientError::validation(
                "endAt",
                "end must be after start",
            )),
            _ => Ok(()),
        }
    }
}
