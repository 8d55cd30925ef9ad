use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Role;
use crate::error::ClientError;
use crate::validation::{require_email, require_text, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "super::id")]
    pub id: String,
    pub email: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub user_type: Option<String>,
    #[serde(default, deserialize_with = "super::opt_id")]
    pub staff_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// "First Last", or the email when no name is on file.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Partial profile update for `PUT /users/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ClientError> {
        if let Some(email) = &self.email {
            require_email("email", email)?;
        }
        Ok(())
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), ClientError> {
        require_email("email", &self.email)?;
        require_text("password", &self.password)
    }
}

/// Reply to a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub access_expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Shortest password the forms accept.
pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn require_password(field: &str, password: &str) -> Result<(), ClientError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::validation(
            field,
            &format!("{field} must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

impl Validate for Registration {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("name", &self.name)?;
        require_email("email", &self.email)?;
        require_password("password", &self.password)
    }
}

/// Body of `POST /auth/reset-password`. Admin-forced reset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub user_id: String,
    pub new_password: String,
}

impl Validate for PasswordReset {
    fn validate(&self) -> Result<(), ClientError> {
        require_text("userId", &self.user_id)?;
        require_password("newPassword", &self.new_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_user() {
        let user: User = serde_json::from_str(
            r#"{"id":3,"email":"ana@ward.org","role":"Doctor","firstName":"Ana","lastName":"Ruiz","staffId":12}"#,
        )
        .unwrap();
        assert_eq!(user.id, "3");
        assert_eq!(user.role, Role::Doctor);
        assert_eq!(user.staff_id.as_deref(), Some("12"));
        assert_eq!(user.display_name(), "Ana Ruiz");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user: User =
            serde_json::from_str(r#"{"id":"u1","email":"desk@ward.org","role":"receptionist"}"#)
                .unwrap();
        assert_eq!(user.display_name(), "desk@ward.org");
    }

    #[test]
    fn update_skips_absent_fields() {
        let update = UserUpdate {
            phone: Some("555-0101".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"phone":"555-0101"}"#);
    }

    #[test]
    fn update_rejects_bad_email() {
        let update = UserUpdate {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
