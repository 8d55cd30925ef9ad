use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;
use crate::error::ClientError;
use crate::validation::{require_email, require_text, Validate};

/// Reference to the doctor responsible for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicianRef {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub user: Option<User>,
    pub primary_physician: Option<PhysicianRef>,
    #[serde(default)]
    pub appointments_count: u32,
    #[serde(default)]
    pub prescriptions_count: u32,
    pub created_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn display_name(&self) -> String {
        self.user
            .as_ref()
            .map(User::display_name)
            .unwrap_or_else(|| format!("Patient #{}", self.id))
    }
}

/// Body of `POST /patients`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_physician_id: Option<String>,
}

impl Validate for NewPatient {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("firstName", &self.first_name)?;
        require_text("phone", &self.phone)?;
        if let Some(email) = &self.email {
            require_email("email", email)?;
        }
        Ok(())
    }
}

/// Body of `POST /patients/issues`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIssue {
    pub patient_id: String,
    pub issue: String,
}

impl Validate for PatientIssue {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("patientId", &self.patient_id)?;
        require_text("issue", &self.issue)
    }
}

/// Body of `POST /patients/admissions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admission {
    pub patient_id: String,
    pub room_id: String,
    pub admission_date: NaiveDate,
}

impl Validate for Admission {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("patientId", &self.patient_id)?;
        require_text("roomId", &self.room_id)
    }
}

/// Body of `POST /patients/discharge`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discharge {
    pub admission_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for Discharge {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("admissionId", &self.admission_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_counts_default_to_zero() {
        let p: Patient = serde_json::from_str(r#"{"id":9}"#).unwrap();
        assert_eq!(p.appointments_count, 0);
        assert_eq!(p.display_name(), "Patient #9");
    }

    #[test]
    fn new_patient_requires_name_and_phone() {
        let mut form = NewPatient {
            first_name: "Lena".into(),
            ..Default::default()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err, ClientError::validation("phone", "phone is required"));
        form.phone = "555-0199".into();
        assert!(form.validate().is_ok());
    }
}
