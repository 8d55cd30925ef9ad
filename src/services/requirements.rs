//! Resource requirements and the fulfillments allocated against them.
//!
//! The three kinds (items, staff, rooms) share one shape: a list endpoint
//! per kind, create and patch, and per-requirement fulfillment records whose
//! resource field is named after the kind.

use serde::Serialize;
use serde_json::Value;

use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{
    Fulfillment, FulfillmentUpdate, ItemRequirement, NewFulfillment, NewItemRequirement,
    NewRoomRequirement, NewStaffRequirement, RequirementKind, RequirementRecord,
    RequirementStatus, RequirementUpdate, RoomRequirement, StaffRequirement,
};
use crate::validation::Validate;

const FULFILLMENTS: &str = "fulfillments";

fn requirement_key(kind: RequirementKind) -> QueryKey {
    QueryKey::new(kind.cache_root())
}

fn fulfillment_key(kind: RequirementKind) -> QueryKey {
    QueryKey::new(FULFILLMENTS).with(kind.path_segment())
}

// ═══════════════════════════════════════════════════════════
// Requirements
// ═══════════════════════════════════════════════════════════

pub struct RequirementService<'a> {
    ops: &'a MedOps,
}

impl<'a> RequirementService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    /// All requirements of one kind, e.g. `list::<RoomRequirement>(None)`.
    /// A status narrows the cached rows without another request.
    pub async fn list<R: RequirementRecord>(
        &self,
        status: Option<&RequirementStatus>,
    ) -> Result<Vec<R>, ClientError> {
        let kind = R::KIND;
        let mut rows: Vec<R> = self
            .ops
            .query(
                requirement_key(kind),
                format!("/requirements/{}", kind.path_segment()),
                QueryParams::new(),
            )
            .await?;
        if let Some(status) = status {
            rows.retain(|r| r.status() == status);
        }
        Ok(rows)
    }

    pub async fn create_items(
        &self,
        form: &NewItemRequirement,
    ) -> Result<ItemRequirement, ClientError> {
        self.create("requirements.items.create", form).await
    }

    pub async fn create_staff(
        &self,
        form: &NewStaffRequirement,
    ) -> Result<StaffRequirement, ClientError> {
        self.create("requirements.staff.create", form).await
    }

    pub async fn create_rooms(
        &self,
        form: &NewRoomRequirement,
    ) -> Result<RoomRequirement, ClientError> {
        self.create("requirements.rooms.create", form).await
    }

    async fn create<F, R>(&self, name: &'static str, form: &F) -> Result<R, ClientError>
    where
        F: Serialize + Validate,
        R: RequirementRecord,
    {
        form.validate()?;
        let kind = R::KIND;
        let path = format!("/requirements/{}", kind.path_segment());
        self.ops
            .mutate(name, &[requirement_key(kind)], async {
                self.ops.http().post(&path, form).await
            })
            .await
    }

    /// `PATCH /requirements/:kind/:id` (status, quantity, window, notes).
    pub async fn update(
        &self,
        kind: RequirementKind,
        id: &str,
        update: &RequirementUpdate,
    ) -> Result<Value, ClientError> {
        let seg = id_segment("id", id)?;
        update.validate()?;
        let path = format!("/requirements/{}/{seg}", kind.path_segment());
        let name = match kind {
            RequirementKind::Items => "requirements.items.update",
            RequirementKind::Staff => "requirements.staff.update",
            RequirementKind::Rooms => "requirements.rooms.update",
        };
        self.ops
            .mutate(name, &[requirement_key(kind)], async {
                self.ops.http().patch(&path, update).await
            })
            .await
    }
}

// ═══════════════════════════════════════════════════════════
// Fulfillments
// ═══════════════════════════════════════════════════════════

pub struct FulfillmentService<'a> {
    ops: &'a MedOps,
}

impl<'a> FulfillmentService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    fn invalidates(kind: RequirementKind) -> [QueryKey; 2] {
        [fulfillment_key(kind), requirement_key(kind)]
    }

    /// Every fulfillment of one kind.
    pub async fn all(&self, kind: RequirementKind) -> Result<Vec<Fulfillment>, ClientError> {
        self.ops
            .query(
                fulfillment_key(kind),
                format!("/fulfillments/{}", kind.path_segment()),
                QueryParams::new(),
            )
            .await
    }

    pub async fn for_requirement(
        &self,
        kind: RequirementKind,
        requirement_id: &str,
    ) -> Result<Vec<Fulfillment>, ClientError> {
        let seg = id_segment("requirementId", requirement_id)?;
        self.ops
            .query(
                fulfillment_key(kind).with(requirement_id.trim()),
                format!("/requirements/{}/{seg}/fulfillments", kind.path_segment()),
                QueryParams::new(),
            )
            .await
    }

    /// Allocate a resource against `requirement`. Closed requirements
    /// (fulfilled or cancelled) are refused before any request.
    pub async fn create<R: RequirementRecord>(
        &self,
        requirement: &R,
        form: &NewFulfillment,
    ) -> Result<Fulfillment, ClientError> {
        let kind = R::KIND;
        if requirement.status().is_closed() {
            return Err(ClientError::InvalidTransition {
                from: requirement.status().as_str().to_string(),
                to: RequirementStatus::InProgress.as_str().to_string(),
            });
        }
        let seg = id_segment("requirementId", requirement.id())?;
        form.validate()?;
        let path = format!("/requirements/{}/{seg}/fulfillments", kind.path_segment());
        let body = form.body(kind);
        tracing::info!(
            kind = kind.path_segment(),
            requirement = requirement.id(),
            quantity = form.quantity,
            "Creating fulfillment"
        );
        self.ops
            .mutate("fulfillments.create", &Self::invalidates(kind), async {
                self.ops.http().post(&path, &body).await
            })
            .await
    }

    pub async fn update(
        &self,
        kind: RequirementKind,
        fulfillment_id: &str,
        update: &FulfillmentUpdate,
    ) -> Result<Fulfillment, ClientError> {
        let seg = id_segment("fulfillmentId", fulfillment_id)?;
        update.validate()?;
        let path = format!("/requirements/{}/fulfillments/{seg}", kind.path_segment());
        self.ops
            .mutate("fulfillments.update", &Self::invalidates(kind), async {
                self.ops.http().patch(&path, update).await
            })
            .await
    }
}
