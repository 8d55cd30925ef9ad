use serde::{Deserialize, Serialize};

use super::enums::RoomStatus;
use crate::error::ClientError;
use crate::validation::{require_positive, require_text, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub room_number: Option<String>,
    #[serde(rename = "type")]
    pub room_type: String,
    pub floor: i32,
    #[serde(default)]
    pub capacity: u32,
    pub status: RoomStatus,
    #[serde(default)]
    pub equipment: Vec<String>,
}

/// Body of `POST /rooms` and `PUT /rooms/:id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomForm {
    pub room_number: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub floor: i32,
    pub capacity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    pub equipment: Vec<String>,
}

impl Validate for RoomForm {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("roomNumber", &self.room_number)?;
        require_text("type", &self.room_type)?;
        require_positive("capacity", i64::from(self.capacity))
    }
}

/// Body of `PATCH /rooms/:id/status`.
#[derive(Debug, Clone, Serialize)]
pub struct RoomStatusChange {
    pub status: RoomStatus,
}
