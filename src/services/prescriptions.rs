use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{ListFilter, NewPrescription, Prescription, PrescriptionFilter};
use crate::validation::Validate;

const ROOT: &str = "prescriptions";

pub struct PrescriptionService<'a> {
    ops: &'a MedOps,
}

impl<'a> PrescriptionService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    pub async fn list(
        &self,
        filter: &PrescriptionFilter,
    ) -> Result<Vec<Prescription>, ClientError> {
        let key = QueryKey::new(ROOT).with(filter);
        self.ops.query(key, "/prescriptions".into(), filter.to_params()).await
    }

    pub async fn get(&self, id: &str) -> Result<Prescription, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(id.trim()),
                format!("/prescriptions/{seg}"),
                QueryParams::new(),
            )
            .await
    }

    /// Issue a prescription. The patient's own prescription list is cached
    /// under `["patients", id, "prescriptions"]`, so patients are refreshed too.
    pub async fn create(&self, form: &NewPrescription) -> Result<Prescription, ClientError> {
        form.validate()?;
        self.ops
            .mutate(
                "prescriptions.create",
                &[QueryKey::new(ROOT), QueryKey::new("patients")],
                async { self.ops.http().post("/prescriptions", form).await },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicationItem;
    use crate::services::testing::signed_in_ops;
    use crate::test_support::{ok, MockBackend};
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;

    fn rx_json() -> serde_json::Value {
        json!({
            "id": 31, "patientId": 7, "doctorId": 3, "diagnosis": "Otitis media",
            "items": [{"name": "Amoxicillin", "quantity": 10}]
        })
    }

    fn routes() -> Router {
        Router::new()
            .route(
                "/api/prescriptions",
                get(|| async { ok(json!([rx_json()])) }).post(|| async { ok(rx_json()) }),
            )
            .route("/api/patients/:id/prescriptions", get(|| async { ok(json!([])) }))
    }

    fn form() -> NewPrescription {
        NewPrescription {
            patient_id: "7".into(),
            doctor_id: "3".into(),
            diagnosis: "Otitis media".into(),
            items: vec![MedicationItem {
                name: "Amoxicillin".into(),
                dosage: Some("500mg".into()),
                duration: Some("5 days".into()),
                quantity: 10,
                day_divide: Some("1-0-1".into()),
                method: None,
            }],
            tests: vec![],
            next_review_date: None,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn list_passes_search_fields() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);
        let filter = PrescriptionFilter {
            search_doctor: Some("ruiz".into()),
            ..Default::default()
        };

        let rows = ops.prescriptions().list(&filter).await.unwrap();
        assert_eq!(rows[0].total_quantity(), 10);
        assert_eq!(backend.requests()[0].uri, "/api/prescriptions?searchDoctor=ruiz");
    }

    #[tokio::test]
    async fn create_refreshes_patient_prescriptions() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);
        ops.patients().prescriptions("7").await.unwrap();

        let rx = ops.prescriptions().create(&form()).await.unwrap();
        assert_eq!(rx.id, "31");

        ops.patients().prescriptions("7").await.unwrap();
        assert_eq!(backend.hits("GET", "/api/patients/7/prescriptions"), 2);
    }
}
