use serde_json::{json, Value};

use super::MedOps;
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{Credentials, LoginResponse, PasswordReset, Registration, User};
use crate::session::Session;
use crate::validation::Validate;

/// Login, logout and the signed-in user's profile.
pub struct AuthService<'a> {
    ops: &'a MedOps,
}

impl<'a> AuthService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    fn me_key() -> QueryKey {
        QueryKey::new("auth").with("me")
    }

    /// `POST /auth/login`, then anonymous → authenticated.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        credentials.validate()?;
        let reply: LoginResponse = self
            .ops
            .mutate("auth.login", &[QueryKey::new("auth")], async {
                self.ops.http().post("/auth/login", credentials).await
            })
            .await?;

        let session = Session {
            user: reply.user,
            access_expires: reply.access_expires,
            access_token: reply.access_token,
        };
        // rows cached for a previous user must not leak into this session
        self.ops.cache().clear();
        self.ops.session().set_session(session.clone());
        Ok(session)
    }

    /// Best-effort `POST /auth/logout`. The local session and cache are
    /// cleared whatever the server says.
    pub async fn logout(&self) {
        let result: Result<Value, ClientError> =
            self.ops.http().post("/auth/logout", &json!({})).await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Logout request failed, clearing local session anyway");
        }
        self.ops.session().clear();
        self.ops.cache().clear();
    }

    /// `GET /auth/me`; refreshes the user held in the session.
    pub async fn me(&self) -> Result<User, ClientError> {
        self.ops.session().require()?;
        let user: User = self
            .ops
            .query(Self::me_key(), "/auth/me".into(), QueryParams::new())
            .await?;
        self.ops.session().update_user(user.clone());
        Ok(user)
    }

    pub async fn register(&self, form: &Registration) -> Result<User, ClientError> {
        form.validate()?;
        self.ops
            .mutate("auth.register", &[QueryKey::new("users")], async {
                self.ops.http().post("/auth/register", form).await
            })
            .await
    }

    /// Admin-forced password reset for another user.
    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ClientError> {
        reset.validate()?;
        self.ops
            .mutate("auth.reset-password", &[], async {
                let _: Value = self.ops.http().post("/auth/reset-password", reset).await?;
                Ok(())
            })
            .await
    }
}
