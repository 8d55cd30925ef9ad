//! Form validation run before any write leaves the client.
//!
//! Services call [`Validate::validate`] first; a failing form returns
//! `ClientError::Validation` and no request is issued.

use crate::error::ClientError;

pub trait Validate {
    fn validate(&self) -> Result<(), ClientError>;
}

/// Non-blank text.
pub fn require_text(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(field, &format!("{field} is required")));
    }
    Ok(())
}

/// Strictly positive quantity.
pub fn require_positive(field: &str, value: i64) -> Result<(), ClientError> {
    if value <= 0 {
        return Err(ClientError::validation(
            field,
            &format!("{field} must be greater than zero"),
        ));
    }
    Ok(())
}

/// Minimal shape check: `local@domain.tld`, no whitespace.
pub fn require_email(field: &str, value: &str) -> Result<(), ClientError> {
    require_text(field, value)?;
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ClientError::validation(field, "enter a valid email address"));
    }
    Ok(())
}

/// `start <= end`. The error is reported on the end field.
pub fn require_range<T: PartialOrd>(field: &str, start: &T, end: &T) -> Result<(), ClientError> {
    if end < start {
        return Err(ClientError::validation(
            field,
            &format!("{field} must not be before the start"),
        ));
    }
    Ok(())
}
