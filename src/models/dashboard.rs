use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Count {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySeries {
    pub date: NaiveDate,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekSeries {
    #[serde(default)]
    pub days: Vec<DaySeries>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LowStock {
    #[serde(default)]
    pub threshold: u64,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringItem {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub name: String,
    pub expiry: String,
    pub days_to_expiry: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandedItem {
    #[serde(deserialize_with = "super::id")]
    pub item_id: String,
    pub name: String,
    pub transactions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_stock: i64,
    #[serde(default)]
    pub expiring_soon: Vec<ExpiringItem>,
    #[serde(default)]
    pub most_in_demand: Vec<DemandedItem>,
}

/// Requirement counts per status, one histogram per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsSummary {
    #[serde(default)]
    pub item: BTreeMap<String, u64>,
    #[serde(default)]
    pub staff: BTreeMap<String, u64>,
    #[serde(default)]
    pub room: BTreeMap<String, u64>,
}

/// `GET /stats/overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSummary {
    pub date: Option<NaiveDate>,
    pub appointments_today: Count,
    pub appointments_last7: WeekSeries,
    pub pending_invitations: Count,
    pub low_stock: LowStock,
    pub rooms_occupied: Count,
    pub staff_on_leave: Count,
    pub inventory_snapshot: InventorySnapshot,
    pub requirements_summary: RequirementsSummary,
    pub recent_activity: Count,
}

impl DashboardSummary {
    /// Appointments across the last seven days with the given status.
    pub fn week_total_for(&self, status: &str) -> u64 {
        self.appointments_last7
            .days
            .iter()
            .filter_map(|d| d.by_status.get(status))
            .sum()
    }

    /// Open requirements across all three kinds.
    pub fn open_requirements(&self) -> u64 {
        let s = &self.requirements_summary;
        [&s.item, &s.staff, &s.room]
            .into_iter()
            .filter_map(|h| h.get("open"))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overview_fills_defaults() {
        let summary: DashboardSummary = serde_json::from_str(
            r#"{"appointmentsToday":{"count":5},
                "appointmentsLast7":{"days":[
                    {"date":"2025-11-15","total":3,"byStatus":{"scheduled":2,"cancelled":1}},
                    {"date":"2025-11-16","total":2,"byStatus":{"scheduled":2}}]},
                "requirementsSummary":{"item":{"open":2},"room":{"open":1,"fulfilled":4}}}"#,
        )
        .unwrap();
        assert_eq!(summary.appointments_today.count, 5);
        assert_eq!(summary.week_total_for("scheduled"), 4);
        assert_eq!(summary.open_requirements(), 3);
        assert_eq!(summary.low_stock, LowStock::default());
    }
}
