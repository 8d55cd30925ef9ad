use serde_json::Value;

use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{ListFilter, Room, RoomFilter, RoomForm, RoomStatus, RoomStatusChange};
use crate::validation::Validate;

const ROOT: &str = "rooms";
const DETAIL: &str = "room";

pub struct RoomService<'a> {
    ops: &'a MedOps,
}

impl<'a> RoomService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    fn invalidates() -> [QueryKey; 2] {
        [QueryKey::new(ROOT), QueryKey::new(DETAIL)]
    }

    pub async fn list(&self, filter: &RoomFilter) -> Result<Vec<Room>, ClientError> {
        let key = QueryKey::new(ROOT).with(filter);
        self.ops.query(key, "/rooms".into(), filter.to_params()).await
    }

    pub async fn get(&self, id: &str) -> Result<Room, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(DETAIL).with(id.trim()),
                format!("/rooms/{seg}"),
                QueryParams::new(),
            )
            .await
    }

    pub async fn create(&self, form: &RoomForm) -> Result<Room, ClientError> {
        form.validate()?;
        self.ops
            .mutate("rooms.create", &Self::invalidates(), async {
                self.ops.http().post("/rooms", form).await
            })
            .await
    }

    pub async fn update(&self, id: &str, form: &RoomForm) -> Result<Room, ClientError> {
        let seg = id_segment("id", id)?;
        form.validate()?;
        self.ops
            .mutate("rooms.update", &Self::invalidates(), async {
                self.ops.http().put(&format!("/rooms/{seg}"), form).await
            })
            .await
    }

    pub async fn set_status(&self, id: &str, status: RoomStatus) -> Result<Room, ClientError> {
        let seg = id_segment("id", id)?;
        let body = RoomStatusChange { status };
        self.ops
            .mutate("rooms.status", &Self::invalidates(), async {
                self.ops.http().patch(&format!("/rooms/{seg}/status"), &body).await
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .mutate("rooms.delete", &Self::invalidates(), async {
                let _: Value = self.ops.http().delete(&format!("/rooms/{seg}")).await?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::signed_in_ops;
    use crate::test_support::{ok, MockBackend};
    use axum::extract::Path;
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::json;

    fn room_json(id: &str, status: &str) -> Value {
        json!({
            "id": id, "roomNumber": "ICU-2", "type": "ICU",
            "floor": 3, "capacity": 1, "status": status
        })
    }

    fn routes() -> Router {
        Router::new()
            .route(
                "/api/rooms",
                get(|| async { ok(json!([room_json("12", "available")])) }),
            )
            .route(
                "/api/rooms/:id",
                get(|Path(id): Path<String>| async move { ok(room_json(&id, "available")) })
                    .delete(|| async { ok(Value::Null) }),
            )
            .route(
                "/api/rooms/:id/status",
                patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    ok(room_json(&id, body["status"].as_str().unwrap_or_default()))
                }),
            )
    }

    #[tokio::test]
    async fn status_change_patches_and_invalidates_detail() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);
        let filter = RoomFilter {
            status: Some(RoomStatus::Available),
            ..Default::default()
        };
        ops.rooms().list(&filter).await.unwrap();
        ops.rooms().get("12").await.unwrap();

        let room = ops.rooms().set_status("12", RoomStatus::Maintenance).await.unwrap();
        assert_eq!(room.status, RoomStatus::Maintenance);
        assert_eq!(backend.hits("PATCH", "/api/rooms/12/status"), 1);
        assert!(ops.cache().is_stale(&QueryKey::new(ROOT).with(&filter)));
        assert!(ops.cache().is_stale(&QueryKey::new(DETAIL).with("12")));
    }

    #[tokio::test]
    async fn list_filter_becomes_query() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);
        let filter = RoomFilter {
            room_type: Some("ICU".into()),
            floor: Some(3),
            ..Default::default()
        };

        ops.rooms().list(&filter).await.unwrap();
        assert_eq!(backend.requests()[0].uri, "/api/rooms?type=ICU&floor=3");
    }

    #[tokio::test]
    async fn delete_accepts_empty_payload() {
        let backend = MockBackend::start(routes()).await;
        let ops = signed_in_ops(&backend);
        ops.rooms().delete("12").await.unwrap();
        assert_eq!(backend.hits("DELETE", "/api/rooms/12"), 1);
    }
}
