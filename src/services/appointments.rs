use serde_json::{json, Value};

use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{
    Appointment, AppointmentAction, AppointmentFilter, AppointmentStatus, ListFilter,
    NewAppointment, Reschedule,
};
use crate::validation::Validate;

const ROOT: &str = "appointments";

/// Booking, lifecycle transitions and the filtered appointment list.
pub struct AppointmentService<'a> {
    ops: &'a MedOps,
}

impl<'a> AppointmentService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    fn invalidates() -> [QueryKey; 1] {
        [QueryKey::new(ROOT)]
    }

    /// `GET /appointments` with the filter's parameters. Rows outside the
    /// selected status or doctor are dropped even if the server sent them.
    pub async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, ClientError> {
        let key = QueryKey::new(ROOT).with(filter);
        let mut rows: Vec<Appointment> = self
            .ops
            .query(key, "/appointments".into(), filter.to_params())
            .await?;
        let before = rows.len();
        rows.retain(|a| filter.matches(a));
        if rows.len() != before {
            tracing::debug!(dropped = before - rows.len(), "Filtered appointment rows");
        }
        Ok(rows)
    }

    pub async fn get(&self, id: &str) -> Result<Appointment, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(id.trim()),
                format!("/appointments/{seg}"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn create(&self, form: &NewAppointment) -> Result<Appointment, ClientError> {
        form.validate()?;
        self.ops
            .mutate("appointments.create", &Self::invalidates(), async {
                self.ops.http().post("/appointments", form).await
            })
            .await
    }

    /// Move `appt` along its lifecycle. Transitions the lifecycle forbids are
    /// refused before any request is made.
    pub async fn transition(
        &self,
        appt: &Appointment,
        action: AppointmentAction,
    ) -> Result<Value, ClientError> {
        appt.status.ensure_transition(&action.target())?;
        let seg = id_segment("id", &appt.id)?;
        let path = format!("/appointments/{seg}/{}", action.path_segment());
        tracing::info!(id = %appt.id, to = %action.target(), "Appointment transition");
        self.ops
            .mutate("appointments.transition", &Self::invalidates(), async {
                self.ops.http().post(&path, &json!({})).await
            })
            .await
    }

    pub async fn reschedule(
        &self,
        appt: &Appointment,
        form: &Reschedule,
    ) -> Result<Value, ClientError> {
        appt.status.ensure_transition(&AppointmentStatus::Rescheduled)?;
        form.validate()?;
        let seg = id_segment("id", &appt.id)?;
        self.ops
            .mutate("appointments.reschedule", &Self::invalidates(), async {
                self.ops
                    .http()
                    .post(&format!("/appointments/{seg}/reschedule"), form)
                    .await
            })
            .await
    }
}
