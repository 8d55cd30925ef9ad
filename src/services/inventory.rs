use serde_json::Value;

use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{
    InventoryFilter, InventoryItem, InventoryTransaction, ListFilter, NewInventoryItem,
    NewStockLot, SellRequest, StockLot, TransactionFilter,
};
use crate::validation::Validate;

const ROOT: &str = "inventory";
const TRANSACTIONS: &str = "inventory-transactions";

/// Catalog, stock lots and the transaction ledger.
pub struct InventoryService<'a> {
    ops: &'a MedOps,
}

impl<'a> InventoryService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    /// Every write moves stock, so both the catalog and the ledger go stale.
    fn invalidates() -> [QueryKey; 3] {
        [
            QueryKey::new(ROOT),
            QueryKey::new(TRANSACTIONS),
            QueryKey::new("inventory-item-by-name"),
        ]
    }

    pub async fn list(&self, filter: &InventoryFilter) -> Result<Vec<InventoryItem>, ClientError> {
        let key = QueryKey::new(ROOT).with(filter);
        self.ops.query(key, "/inventory".into(), filter.to_params()).await
    }

    /// Exact-name lookup; the name is percent-encoded into the path.
    pub async fn item_by_name(&self, name: &str) -> Result<InventoryItem, ClientError> {
        let seg = id_segment("name", name)?;
        self.ops
            .query(
                QueryKey::new("inventory-item-by-name").with(name.trim()),
                format!("/inventory/by-name/{seg}"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn stock(&self, item_id: &str) -> Result<Vec<StockLot>, ClientError> {
        let seg = id_segment("itemId", item_id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(item_id.trim()).with("stock"),
                format!("/inventory/{seg}/stock"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<InventoryTransaction>, ClientError> {
        let key = QueryKey::new(TRANSACTIONS).with(filter);
        self.ops
            .query(key, "/inventory/transactions".into(), filter.to_params())
            .await
    }

    pub async fn create_item(&self, form: &NewInventoryItem) -> Result<InventoryItem, ClientError> {
        form.validate()?;
        self.ops
            .mutate("inventory.create-item", &Self::invalidates(), async {
                self.ops.http().post("/inventory/items", form).await
            })
            .await
    }

    pub async fn add_stock(
        &self,
        item_id: &str,
        lot: &NewStockLot,
    ) -> Result<StockLot, ClientError> {
        let seg = id_segment("itemId", item_id)?;
        lot.validate()?;
        self.ops
            .mutate("inventory.add-stock", &Self::invalidates(), async {
                self.ops.http().post(&format!("/inventory/{seg}/stock"), lot).await
            })
            .await
    }

    /// Dispense by id or exact name. The server draws from the earliest
    /// expiring lots and rejects sales beyond the available quantity.
    pub async fn sell(&self, request: &SellRequest) -> Result<Value, ClientError> {
        request.validate()?;
        self.ops
            .mutate("inventory.sell", &Self::invalidates(), async {
                self.ops.http().post("/inventory/sell", request).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InventoryKind, TransactionType};
    use crate::services::testing::signed_in_ops;
    use crate::test_support::{ok, MockBackend};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    fn item_json() -> Value {
        json!({"id": "i1", "name": "Saline 0.9%", "type": "medicine", "totalQuantity": 40})
    }

    fn routes() -> Router {
        Router::new()
            .route("/api/inventory", get(|| async { ok(json!([item_json()])) }))
            .route("/api/inventory/by-name/:name", get(|| async { ok(item_json()) }))
            .route(
                "/api/inventory/transactions",
                get(|| async {
                    ok(json!([{
                        "id": "t1", "type": "in", "quantity": 40, "reason": "delivery",
                        "createdAt": "2025-11-16T08:30:00Z",
                        "inventoryItem": {"id": "i1", "name": "Saline 0.9%"}
                    }]))
                }),
            )
            .route(
                "/api/inventory/sell",
                post(|Json(body): Json<Value>| async move {
                    if body["quantity"].as_i64().unwrap_or_default() > 40 {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "success": false,
                                "error": {"message": "Insufficient stock"}
                            })),
                        )
                            .into_response()
                    } else {
                        ok(json!({"sold": body["quantity"]})).into_response()
                    }
                }),
            )
    }

    #[tokio::test]
    async fn by_name_lookup_is_percent_encoded() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);

        let item = ops.inventory().item_by_name("Saline 0.9%").await.unwrap();
        assert_eq!(item.kind, InventoryKind::Medicine);
        assert_eq!(backend.requests()[0].uri, "/api/inventory/by-name/Saline%200.9%25");
    }

    #[tokio::test]
    async fn sale_invalidates_ledger() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);
        let filter = TransactionFilter::default();
        let rows = ops.inventory().transactions(&filter).await.unwrap();
        assert_eq!(rows[0].kind, TransactionType::In);

        ops.inventory()
            .sell(&SellRequest {
                item_id_or_name: "Saline 0.9%".into(),
                quantity: 4,
            })
            .await
            .unwrap();

        assert!(ops.cache().is_stale(&QueryKey::new(TRANSACTIONS).with(&filter)));
        ops.inventory().transactions(&filter).await.unwrap();
        assert_eq!(backend.hits("GET", "/api/inventory/transactions"), 2);
    }

    #[tokio::test]
    async fn oversell_surfaces_server_message() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);

        let err = ops
            .inventory()
            .sell(&SellRequest {
                item_id_or_name: "i1".into(),
                quantity: 99,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "Insufficient stock");
        assert!(matches!(
            ops.mutation("inventory.sell").state(),
            crate::mutation::MutationState::Error(msg) if msg == "Insufficient stock"
        ));
    }

    #[tokio::test]
    async fn zero_quantity_sale_rejected_locally() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);

        let err = ops
            .inventory()
            .sell(&SellRequest {
                item_id_or_name: "i1".into(),
                quantity: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation { field, .. } if field == "quantity"));
        assert_eq!(backend.hits("POST", "/api/inventory/sell"), 0);
    }
}
