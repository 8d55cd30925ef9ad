use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{
    Appointment, Leave, LeaveRequest, ListFilter, NewDoctor, NewStaff, NewTiming, ScheduleFilter,
    Specialty, Staff, StaffFilter, StaffSchedule, StaffTiming,
};
use crate::validation::Validate;

const ROOT: &str = "staff";

/// Staff directory, doctors, specialties and the timing/leave boards.
pub struct StaffService<'a> {
    ops: &'a MedOps,
}

impl<'a> StaffService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    /// Every staff-derived list a write can change.
    fn invalidates() -> [QueryKey; 4] {
        [
            QueryKey::new(ROOT),
            QueryKey::new("staff-timings"),
            QueryKey::new("staff-leaves"),
            QueryKey::new("doctors"),
        ]
    }

    pub async fn list(&self, filter: &StaffFilter) -> Result<Vec<Staff>, ClientError> {
        let key = QueryKey::new(ROOT).with(filter);
        self.ops.query(key, "/staff".into(), filter.to_params()).await
    }

    pub async fn get(&self, id: &str) -> Result<Staff, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(id.trim()),
                format!("/staff/{seg}"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn timings(&self, id: &str) -> Result<Vec<StaffTiming>, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(id.trim()).with("timings"),
                format!("/staff/{seg}/timings"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn leaves(&self, id: &str) -> Result<Vec<Leave>, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(id.trim()).with("leaves"),
                format!("/staff/{seg}/leaves"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn appointments(&self, id: &str) -> Result<Vec<Appointment>, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(id.trim()).with("appointments"),
                format!("/staff/{seg}/appointments"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn specialties(&self) -> Result<Vec<Specialty>, ClientError> {
        self.ops
            .query(QueryKey::new("specialties"), "/specialties".into(), QueryParams::new())
            .await
    }

    pub async fn doctors(&self) -> Result<Vec<Staff>, ClientError> {
        self.ops
            .query(QueryKey::new("doctors"), "/doctors".into(), QueryParams::new())
            .await
    }

    /// Weekly timing board across staff.
    pub async fn timing_board(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<Vec<StaffSchedule>, ClientError> {
        let key = QueryKey::new("staff-timings").with(filter);
        self.ops.query(key, "/staff/timings".into(), filter.to_params()).await
    }

    /// Leave board across staff.
    pub async fn leave_board(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<Vec<StaffSchedule>, ClientError> {
        let key = QueryKey::new("staff-leaves").with(filter);
        self.ops.query(key, "/staff/leaves".into(), filter.to_params()).await
    }

    pub async fn create(&self, form: &NewStaff) -> Result<Staff, ClientError> {
        form.validate()?;
        self.ops
            .mutate("staff.create", &Self::invalidates(), async {
                self.ops.http().post("/staff", form).await
            })
            .await
    }

    /// Promote a staff member to doctor with one or more specialities.
    pub async fn add_doctor(&self, form: &NewDoctor) -> Result<Staff, ClientError> {
        form.validate()?;
        self.ops
            .mutate("staff.add-doctor", &Self::invalidates(), async {
                self.ops.http().post("/staff/doctors", form).await
            })
            .await
    }

    pub async fn add_timing(
        &self,
        staff_id: &str,
        form: &NewTiming,
    ) -> Result<StaffTiming, ClientError> {
        let seg = id_segment("staffId", staff_id)?;
        form.validate()?;
        self.ops
            .mutate("staff.add-timing", &Self::invalidates(), async {
                self.ops.http().post(&format!("/staff/{seg}/timings"), form).await
            })
            .await
    }

    pub async fn request_leave(&self, form: &LeaveRequest) -> Result<Leave, ClientError> {
        form.validate()?;
        self.ops
            .mutate("staff.request-leave", &Self::invalidates(), async {
                self.ops.http().post("/staff/leaves", form).await
            })
            .await
    }
}
