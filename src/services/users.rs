use super::{id_segment, MedOps};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::QueryParams;
use crate::models::{ListFilter, User, UserFilter, UserUpdate};
use crate::validation::Validate;

const ROOT: &str = "users";

/// User directory (admin screens).
pub struct UserService<'a> {
    ops: &'a MedOps,
}

impl<'a> UserService<'a> {
    pub(super) fn new(ops: &'a MedOps) -> Self {
        Self { ops }
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, ClientError> {
        let key = QueryKey::new(ROOT).with(filter);
        self.ops.query(key, "/users".into(), filter.to_params()).await
    }

    pub async fn get(&self, id: &str) -> Result<User, ClientError> {
        let seg = id_segment("id", id)?;
        self.ops
            .query(
                QueryKey::new(ROOT).with(id.trim()),
                format!("/users/{seg}"),
                QueryParams::new(),
            )
            .await
    }

    /// `PUT /users/:id`. Patient rows embed their user, so those go stale too.
    /// Updating the signed-in user refreshes the session copy.
    pub async fn update(&self, id: &str, update: &UserUpdate) -> Result<User, ClientError> {
        let seg = id_segment("id", id)?;
        update.validate()?;
        let user: User = self
            .ops
            .mutate(
                "users.update",
                &[QueryKey::new(ROOT), QueryKey::new("patients")],
                async { self.ops.http().put(&format!("/users/{seg}"), update).await },
            )
            .await?;
        if self.ops.session().user().is_some_and(|me| me.id == user.id) {
            self.ops.session().update_user(user.clone());
        }
        Ok(user)
    }
}
