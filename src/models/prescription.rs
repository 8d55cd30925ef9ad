use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::validation::{require_positive, require_text, Validate};

/// One medication line on a prescription.
///
/// `day_divide` is the dosing pattern code written on the slip
/// (e.g. `1-0-1` for morning and night).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationItem {
    pub name: String,
    pub dosage: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    pub day_divide: Option<String>,
    pub method: Option<String>,
}

impl Validate for MedicationItem {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("items.name", &self.name)?;
        require_positive("items.quantity", i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(deserialize_with = "super::id")]
    pub patient_id: String,
    #[serde(deserialize_with = "super::id")]
    pub doctor_id: String,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub diagnosis: Option<String>,
    pub next_review_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<MedicationItem>,
    #[serde(default)]
    pub tests: Vec<String>,
    pub remarks: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Prescription {
    /// Total units dispensed across all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Body of `POST /prescriptions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrescription {
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis: String,
    pub items: Vec<MedicationItem>,
    pub tests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Validate for NewPrescription {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("patientId", &self.patient_id)?;
        require_text("doctorId", &self.doctor_id)?;
        require_text("diagnosis", &self.diagnosis)?;
        if self.items.is_empty() {
            return Err(ClientError::validation(
                "items",
                "at least one medication is required",
            ));
        }
        self.items.iter().try_for_each(Validate::validate)
    }
}
