use super::MedOps;
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::DashboardSummary;

pub struct DashboardService<'a> {
    ops: &'a MedOps,
}

impl<'a> DashboardService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    /// `GET /stats/overview`. Sections the server omits read as zero.
    pub async fn summary(&self) -> Result<DashboardSummary, ClientError> {
        self.ops
            .query(
                QueryKey::new("dashboard").with("summary"),
                "/stats/overview".into(),
                QueryParams::new(),
            )
            .await
    }
}
