//! Typed resource services.
//!
//! `MedOps` is the single shared state of a client: one HTTP client, one
//! session store, one query cache, one registry of write trackers. Each
//! resource gets a borrowing service (`ops.patients()`, `ops.rooms()`, ...)
//! whose reads go through the cache and whose writes run as mutations.

mod appointments;
mod auth;
mod dashboard;
mod inventory;
mod patients;
mod prescriptions;
mod requirements;
mod rooms;
mod staff;
mod users;

pub use appointments::AppointmentService;
pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use inventory::InventoryService;
pub use patients::PatientService;
pub use prescriptions::PrescriptionService;
pub use requirements::{FulfillmentService, RequirementService};
pub use rooms::RoomService;
pub use staff::StaffService;
pub use users::UserService;

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::{QueryCache, QueryKey};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{path_segment, HttpClient, QueryParams};
use crate::mutation::{Mutation, MutationRegistry};
use crate::session::{FileStorage, SessionStore};
use crate::validation::require_text;

// ═══════════════════════════════════════════════════════════
// MedOps — shared client state
// ═══════════════════════════════════════════════════════════

pub struct MedOps {
    config: ClientConfig,
    http: HttpClient,
    session: Arc<SessionStore>,
    cache: Arc<QueryCache>,
    mutations: MutationRegistry,
}

impl MedOps {
    /// Client with the session persisted to `config.session_file`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = FileStorage::new(config.session_file.clone());
        let session = Arc::new(SessionStore::load(Box::new(storage)));
        Self::with_session(config, session)
    }

    /// Client over an existing session store (in-memory sessions, tests).
    pub fn with_session(
        config: ClientConfig,
        session: Arc<SessionStore>,
    ) -> Result<Self, ClientError> {
        let http = HttpClient::new(&config, session.clone())?;
        let cache = Arc::new(QueryCache::from_config(&config));
        let on_sign_out = Arc::downgrade(&cache);
        session.on_sign_out(move || {
            if let Some(cache) = on_sign_out.upgrade() {
                cache.clear();
            }
        });
        tracing::info!(base_url = %config.base_url, "MedOps client ready");
        Ok(Self {
            config,
            http,
            session,
            cache,
            mutations: MutationRegistry::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Tracker for one named write, e.g. `"appointments.create"`.
    pub fn mutation(&self, name: &'static str) -> Arc<Mutation> {
        self.mutations.get(name)
    }

    pub fn is_pending(&self, name: &'static str) -> bool {
        self.mutations.is_pending(name)
    }

    // ── services ──

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn patients(&self) -> PatientService<'_> {
        PatientService::new(self)
    }

    pub fn staff(&self) -> StaffService<'_> {
        StaffService::new(self)
    }

    pub fn appointments(&self) -> AppointmentService<'_> {
        AppointmentService::new(self)
    }

    pub fn prescriptions(&self) -> PrescriptionService<'_> {
        PrescriptionService::new(self)
    }

    pub fn inventory(&self) -> InventoryService<'_> {
        InventoryService::new(self)
    }

    pub fn rooms(&self) -> RoomService<'_> {
        RoomService::new(self)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }

    pub fn requirements(&self) -> RequirementService<'_> {
        RequirementService::new(self)
    }

    pub fn fulfillments(&self) -> FulfillmentService<'_> {
        FulfillmentService::new(self)
    }

    pub fn dashboard(&self) -> DashboardService<'_> {
        DashboardService::new(self)
    }

    // ── plumbing shared by the services ──

    /// Cached GET of `path` under `key`.
    pub(crate) async fn query<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        path: String,
        params: QueryParams,
    ) -> Result<T, ClientError> {
        let http = self.http.clone();
        self.cache
            .fetch(&key, move || {
                let http = http.clone();
                let path = path.clone();
                let params = params.clone();
                async move { http.get_value(&path, &params).await }
            })
            .await
    }

    /// Run a write under the tracker `name`, invalidating `invalidates` on success.
    pub(crate) async fn mutate<T, Fut>(
        &self,
        name: &'static str,
        invalidates: &[QueryKey],
        write: Fut,
    ) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        self.mutations
            .get(name)
            .run(&self.cache, invalidates, write)
            .await
    }
}

/// Validated, escaped path segment for a record identifier.
pub(crate) fn id_segment(field: &str, raw: &str) -> Result<String, ClientError> {
    require_text(field, raw)?;
    Ok(path_segment(raw.trim()))
}
