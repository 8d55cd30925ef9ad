use serde_json::Value;

use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{
    Admission, Appointment, Discharge, ListFilter, NewPatient, Patient, PatientFilter,
    PatientIssue, Prescription, UserUpdate,
};
use crate::validation::Validate;

const ROOT: &str = "patients";

pub struct PatientService<'a> {
    ops: &'a MedOps,
}

impl<'a> PatientService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    fn invalidates() -> [QueryKey; 1] {
        [QueryKey::new(ROOT)]
    }

    pub async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>, ClientError> {
        let key = QueryKey::new(ROOT).with(filter);
        self.ops.query(key, "/patients".into(), filter.to_params()).await
    }

    pub async fn get(&self, id: &str) -> Result<Patient, ClientError> {
        let seg = id_segment("id", id)?;
        let key = QueryKey::new(ROOT).with(id.trim());
        self.ops
            .query(key, format!("/patients/{seg}"), QueryParams::new())
            .await
    }

    pub async fn appointments(&self, id: &str) -> Result<Vec<Appointment>, ClientError> {
        let seg = id_segment("id", id)?;
        let key = QueryKey::new(ROOT).with(id.trim()).with("appointments");
        self.ops
            .query(key, format!("/patients/{seg}/appointments"), QueryParams::new())
            .await
    }

    pub async fn prescriptions(&self, id: &str) -> Result<Vec<Prescription>, ClientError> {
        let seg = id_segment("id", id)?;
        let key = QueryKey::new(ROOT).with(id.trim()).with("prescriptions");
        self.ops
            .query(key, format!("/patients/{seg}/prescriptions"), QueryParams::new())
            .await
    }

    pub async fn create(&self, form: &NewPatient) -> Result<Patient, ClientError> {
        form.validate()?;
        self.ops
            .mutate("patients.create", &Self::invalidates(), async {
                self.ops.http().post("/patients", form).await
            })
            .await
    }

    /// Profile fields live on the linked user: `PUT /users/:userId`.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &UserUpdate,
    ) -> Result<Value, ClientError> {
        let seg = id_segment("userId", user_id)?;
        update.validate()?;
        self.ops
            .mutate(
                "patients.update",
                &[QueryKey::new(ROOT), QueryKey::new("users")],
                async { self.ops.http().put(&format!("/users/{seg}"), update).await },
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .mutate("patients.delete", &Self::invalidates(), async {
                let _: Value = self.ops.http().delete(&format!("/patients/{seg}")).await?;
                Ok(())
            })
            .await
    }

    pub async fn report_issue(&self, issue: &PatientIssue) -> Result<Value, ClientError> {
        issue.validate()?;
        self.ops
            .mutate("patients.issue", &Self::invalidates(), async {
                self.ops.http().post("/patients/issues", issue).await
            })
            .await
    }

    pub async fn admit(&self, admission: &Admission) -> Result<Value, ClientError> {
        admission.validate()?;
        self.ops
            .mutate(
                "patients.admit",
                &[QueryKey::new(ROOT), QueryKey::new("rooms")],
                async { self.ops.http().post("/patients/admissions", admission).await },
            )
            .await
    }

    pub async fn discharge(&self, discharge: &Discharge) -> Result<Value, ClientError> {
        discharge.validate()?;
        self.ops
            .mutate(
                "patients.discharge",
                &[QueryKey::new(ROOT), QueryKey::new("rooms")],
                async { self.ops.http().post("/patients/discharge", discharge).await },
            )
            .await
    }
}
