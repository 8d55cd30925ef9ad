use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{InventoryKind, TransactionType};
use crate::error::ClientError;
use crate::validation::{require_positive, require_text, Validate};

/// Catalog entry. Quantities live on stock lots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InventoryKind,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLot {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(default, deserialize_with = "super::opt_id")]
    pub item_id: Option<String>,
    pub quantity: i64,
    pub expiry: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl StockLot {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry.is_some_and(|e| e < today)
    }
}

/// Item summary embedded in each transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<InventoryKind>,
    pub manufacturer: Option<String>,
}

/// One in/out/adjust movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: i64,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub inventory_item: TransactionItem,
}

/// Body of `POST /inventory/items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub kind: InventoryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    pub quantity: i64,
}

impl Validate for NewInventoryItem {
    fn validate(&self) -> Result<(), ClientError> {
        match self.kind {
            InventoryKind::Blood => {
                require_text("bloodGroup", self.blood_group.as_deref().unwrap_or_default())?
            }
            _ => require_text("name", self.name.as_deref().unwrap_or_default())?,
        }
        require_positive("quantity", self.quantity)
    }
}

/// Body of `POST /inventory/:id/stock`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockLot {
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for NewStockLot {
    fn validate(&self) -> Result<(), ClientError> {
        require_positive("quantity", self.quantity)
    }
}

/// Body of `POST /inventory/sell`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub item_id_or_name: String,
    pub quantity: i64,
}

impl Validate for SellRequest {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("itemIdOrName", &self.item_id_or_name)?;
        require_positive("quantity", self.quantity)
    }
}
