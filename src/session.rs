//! Authentication session.
//!
//! Two states: anonymous and authenticated. Login moves to authenticated,
//! logout or a detected expiry moves back. The session is persisted through
//! a [`SessionStorage`] so a restarted client resumes where it left off.
//!
//! No refresh-token rotation: the session is held exactly as the server
//! issued it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::models::User;

/// Storage key of the persisted session record.
pub const STORAGE_KEY: &str = "auth:session";

// ═══════════════════════════════════════════════════════════
// Session / AuthState
// ═══════════════════════════════════════════════════════════

/// What the server handed back on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub access_expires: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Session {
    /// A session without an expiry never expires client-side.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.access_expires.is_some_and(|exp| exp <= now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticated(Session),
}

// ═══════════════════════════════════════════════════════════
// Storage backends
// ═══════════════════════════════════════════════════════════

/// Key/value persistence for session records.
pub trait SessionStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn save(&self, key: &str, raw: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, ClientError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn save(&self, key: &str, raw: &str) -> Result<(), ClientError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

/// One JSON object on disk mapping keys to raw strings.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, ClientError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| ClientError::Storage(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }

    fn write_all(&self, slots: &HashMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClientError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string(slots).map_err(|e| ClientError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| ClientError::Storage(e.to_string()))
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, raw: &str) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // A corrupt file is overwritten rather than blocking login.
        let mut slots = self.read_all().unwrap_or_default();
        slots.insert(key.to_string(), raw.to_string());
        self.write_all(&slots)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = self.read_all().unwrap_or_default();
        if slots.remove(key).is_some() {
            self.write_all(&slots)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// SessionStore
// ═══════════════════════════════════════════════════════════

type SignOutHook = Box<dyn Fn() + Send + Sync>;

/// Process-wide auth state shared by the HTTP client and the router.
pub struct SessionStore {
    state: RwLock<AuthState>,
    storage: Box<dyn SessionStorage>,
    sign_out_hooks: Mutex<Vec<SignOutHook>>,
}

impl SessionStore {
    /// Start anonymous without reading storage.
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self {
            state: RwLock::new(AuthState::Anonymous),
            storage,
            sign_out_hooks: Mutex::new(Vec::new()),
        }
    }

    /// Run `hook` on every authenticated → anonymous transition: logout,
    /// a rejected token or a detected expiry.
    pub fn on_sign_out<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.sign_out_hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(hook));
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Restore a persisted session. Missing, unreadable or corrupt records
    /// load as anonymous.
    pub fn load(storage: Box<dyn SessionStorage>) -> Self {
        let restored = match storage.load(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable session record");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Session storage unavailable");
                None
            }
        };

        let store = Self::new(storage);
        if let Some(session) = restored {
            tracing::debug!(user = %session.user.email, "Restored session");
            *store.state.write().unwrap_or_else(PoisonError::into_inner) =
                AuthState::Authenticated(session);
        }
        store
    }

    /// anonymous → authenticated (or replace the current session).
    pub fn set_session(&self, session: Session) {
        match serde_json::to_string(&session) {
            Ok(raw) => {
                if let Err(e) = self.storage.save(STORAGE_KEY, &raw) {
                    tracing::warn!(error = %e, "Failed to persist session");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode session"),
        }
        tracing::info!(user = %session.user.email, role = %session.user.role, "Signed in");
        *self.state.write().unwrap_or_else(PoisonError::into_inner) =
            AuthState::Authenticated(session);
    }

    /// authenticated → anonymous. Idempotent.
    pub fn clear(&self) {
        let previous = std::mem::replace(
            &mut *self.state.write().unwrap_or_else(PoisonError::into_inner),
            AuthState::Anonymous,
        );
        if let Err(e) = self.storage.remove(STORAGE_KEY) {
            tracing::warn!(error = %e, "Failed to remove persisted session");
        }
        if let AuthState::Authenticated(session) = previous {
            tracing::info!(user = %session.user.email, "Signed out");
            let hooks = self.sign_out_hooks.lock().unwrap_or_else(PoisonError::into_inner);
            for hook in hooks.iter() {
                hook();
            }
        }
    }

    /// Replace the stored user (after `GET /auth/me`) without touching expiry.
    pub fn update_user(&self, user: User) {
        let updated = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                AuthState::Authenticated(session) => {
                    session.user = user;
                    Some(session.clone())
                }
                AuthState::Anonymous => None,
            }
        };
        if let Some(session) = updated {
            if let Ok(raw) = serde_json::to_string(&session) {
                if let Err(e) = self.storage.save(STORAGE_KEY, &raw) {
                    tracing::warn!(error = %e, "Failed to persist session");
                }
            }
        }
    }

    /// Current session, detecting expiry against the wall clock.
    pub fn current(&self) -> Option<Session> {
        self.current_at(Utc::now())
    }

    /// Current session as of `now`. An expired session is cleared.
    pub fn current_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let session = match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            AuthState::Authenticated(session) => session.clone(),
            AuthState::Anonymous => return None,
        };
        if session.is_expired_at(now) {
            tracing::info!(user = %session.user.email, "Session expired");
            self.clear();
            return None;
        }
        Some(session)
    }

    /// The session, or the reason there is none.
    pub fn require(&self) -> Result<Session, ClientError> {
        let was_authenticated = self.is_signed_in_raw();
        self.current().ok_or(if was_authenticated {
            ClientError::SessionExpired
        } else {
            ClientError::Unauthorized
        })
    }

    pub fn state(&self) -> AuthState {
        match self.current() {
            Some(session) => AuthState::Authenticated(session),
            None => AuthState::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn user(&self) -> Option<User> {
        self.current().map(|s| s.user)
    }

    pub fn access_token(&self) -> Option<String> {
        self.current().and_then(|s| s.access_token)
    }

    fn is_signed_in_raw(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            AuthState::Authenticated(_)
        )
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
