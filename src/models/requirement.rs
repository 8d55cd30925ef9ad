use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::enums::{ItemRequirementKind, RequirementStatus, Role};
use crate::error::ClientError;
use crate::validation::{require_positive, require_text, Validate};

/// Which resource a requirement asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    Items,
    Staff,
    Rooms,
}

impl RequirementKind {
    /// Segment under `/requirements/` and `/fulfillments/`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Staff => "staff",
            Self::Rooms => "rooms",
        }
    }

    /// Body field naming the allocated resource in a fulfillment.
    pub fn resource_field(self) -> &'static str {
        match self {
            Self::Items => "itemId",
            Self::Staff => "staffId",
            Self::Rooms => "roomId",
        }
    }

    /// Root of the cache key holding this kind's requirement list.
    pub fn cache_root(self) -> &'static str {
        match self {
            Self::Items => "item-reqs",
            Self::Staff => "staff-reqs",
            Self::Rooms => "room-reqs",
        }
    }
}

/// What the services read from any requirement row: the id for nested
/// paths and the status for filtering and closing.
pub trait RequirementRecord: DeserializeOwned + Clone + Send + 'static {
    const KIND: RequirementKind;

    fn id(&self) -> &str;
    fn status(&self) -> &RequirementStatus;
}

/// Scheduling window and bookkeeping common to all requirement kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementWindow {
    pub notes: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub estimated_end_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequirement {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(deserialize_with = "super::id")]
    pub primary_user_id: String,
    pub kind: ItemRequirementKind,
    pub quantity: u32,
    pub status: RequirementStatus,
    #[serde(flatten)]
    pub window: RequirementWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRequirement {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(deserialize_with = "super::id")]
    pub primary_user_id: String,
    pub role: Role,
    #[serde(default, deserialize_with = "super::opt_id")]
    pub specialty_id: Option<String>,
    pub quantity: u32,
    pub status: RequirementStatus,
    #[serde(flatten)]
    pub window: RequirementWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequirement {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(deserialize_with = "super::id")]
    pub primary_user_id: String,
    pub room_type: String,
    pub quantity: u32,
    pub status: RequirementStatus,
    #[serde(flatten)]
    pub window: RequirementWindow,
}

macro_rules! requirement_record {
    ($ty:ty, $kind:expr) => {
        impl RequirementRecord for $ty {
            const KIND: RequirementKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }
            fn status(&self) -> &RequirementStatus {
                &self.status
            }
        }
    };
}

requirement_record!(ItemRequirement, RequirementKind::Items);
requirement_record!(StaffRequirement, RequirementKind::Staff);
requirement_record!(RoomRequirement, RequirementKind::Rooms);

/// Shared part of every create form.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementBase {
    pub primary_user_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_end_time: Option<DateTime<Utc>>,
}

impl Validate for RequirementBase {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("primaryUserId", &self.primary_user_id)?;
        require_positive("quantity", i64::from(self.quantity))?;
        if let (Some(start), Some(end)) = (self.start_time, self.estimated_end_time) {
            if end <= start {
                return Err(ClientError::validation(
                    "estimatedEndTime",
                    "estimated end must be after start",
                ));
            }
        }
        Ok(())
    }
}

/// Body of `POST /requirements/items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemRequirement {
    pub kind: ItemRequirementKind,
    #[serde(flatten)]
    pub base: RequirementBase,
}

/// Body of `POST /requirements/staff`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffRequirement {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty_id: Option<String>,
    #[serde(flatten)]
    pub base: RequirementBase,
}

/// Body of `POST /requirements/rooms`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoomRequirement {
    pub room_type: String,
    #[serde(flatten)]
    pub base: RequirementBase,
}

impl Validate for NewItemRequirement {
    fn validate(&self) -> Result<(), ClientError> {
        self.base.validate()
    }
}

impl Validate for NewStaffRequirement {
    fn validate(&self) -> Result<(), ClientError> {
        self.base.validate()
    }
}

impl Validate for NewRoomRequirement {
    fn validate(&self) -> Result<(), ClientError> {
        self.base.validate()?;
        require_text("roomType", &self.room_type)
    }
}

/// Body of `PATCH /requirements/:kind/:id`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequirementStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_end_time: Option<DateTime<Utc>>,
}

impl Validate for RequirementUpdate {
    fn validate(&self) -> Result<(), ClientError> {
        if let Some(quantity) = self.quantity {
            require_positive("quantity", i64::from(quantity))?;
        }
        Ok(())
    }
}

/// A concrete allocation satisfying (part of) a requirement.
///
/// Rows name their foreign keys per kind (`itemRequirementId`/`itemId`,
/// `roomRequirementId`/`roomId`, ...); all spellings land in the same fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "super::opt_id",
        alias = "itemRequirementId",
        alias = "staffRequirementId",
        alias = "roomRequirementId"
    )]
    pub requirement_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::opt_id",
        alias = "itemId",
        alias = "staffId",
        alias = "roomId"
    )]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    pub status: Option<RequirementStatus>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /requirements/:kind/:id/fulfillments`. The resource field is
/// named after the kind when sent (see [`RequirementKind::resource_field`]).
#[derive(Debug, Clone)]
pub struct NewFulfillment {
    pub resource_id: String,
    pub quantity: u32,
}

impl NewFulfillment {
    pub fn body(&self, kind: RequirementKind) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(
            kind.resource_field().to_string(),
            self.resource_id.trim().into(),
        );
        body.insert("quantity".to_string(), self.quantity.into());
        serde_json::Value::Object(body)
    }
}

impl Validate for NewFulfillment {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("resourceId", &self.resource_id)?;
        require_positive("quantity", i64::from(self.quantity))
    }
}

/// Body of `PATCH /requirements/:kind/fulfillments/:fid`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequirementStatus>,
}

impl Validate for FulfillmentUpdate {
    fn validate(&self) -> Result<(), ClientError> {
        if let Some(quantity) = self.quantity {
            require_positive("quantity", i64::from(quantity))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_primary_user_is_rejected() {
        let form = NewItemRequirement {
            kind: ItemRequirementKind::Equipment,
            base: RequirementBase {
                primary_user_id: "   ".into(),
                quantity: 2,
                ..Default::default()
            },
        };
        assert_eq!(
            form.validate().unwrap_err(),
            ClientError::validation("primaryUserId", "primaryUserId is required")
        );
    }

    #[test]
    fn create_body_is_flat() {
        let form = NewItemRequirement {
            kind: ItemRequirementKind::Blood,
            base: RequirementBase {
                primary_user_id: "u7".into(),
                quantity: 2,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "blood", "primaryUserId": "u7", "quantity": 2})
        );
    }

    #[test]
    fn row_reads_flattened_window() {
        let req: RoomRequirement = serde_json::from_str(
            r#"{"id":1,"primaryUserId":"u1","roomType":"ICU","quantity":1,"status":"open",
                "notes":"post-op","startTime":"2025-11-16T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.window.notes.as_deref(), Some("post-op"));
        assert_eq!(req.status(), &RequirementStatus::Open);
        assert_eq!(RoomRequirement::KIND.cache_root(), "room-reqs");
    }

    #[test]
    fn end_before_start_rejected() {
        let start: DateTime<Utc> = "2025-11-16T10:00:00Z".parse().unwrap();
        let base = RequirementBase {
            primary_user_id: "u1".into(),
            quantity: 1,
            start_time: Some(start),
            estimated_end_time: Some(start),
            ..Default::default()
        };
        assert!(base.validate().is_err());
    }

    #[test]
    fn fulfillment_rows_accept_kind_specific_keys() {
        let row: Fulfillment = serde_json::from_str(
            r#"{"id":"f1","itemRequirementId":"r1","itemId":9,"quantity":3}"#,
        )
        .unwrap();
        assert_eq!(row.requirement_id.as_deref(), Some("r1"));
        assert_eq!(row.resource_id.as_deref(), Some("9"));

        let row: Fulfillment =
            serde_json::from_str(r#"{"id":2,"roomId":"icu-1","quantity":1}"#).unwrap();
        assert_eq!(row.resource_id.as_deref(), Some("icu-1"));
        assert!(row.requirement_id.is_none());
    }

    #[test]
    fn fulfillment_body_names_resource_by_kind() {
        let form = NewFulfillment {
            resource_id: " s4 ".into(),
            quantity: 1,
        };
        assert_eq!(
            form.body(RequirementKind::Staff),
            serde_json::json!({"staffId": "s4", "quantity": 1})
        );
    }
}
