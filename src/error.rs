//! Client error taxonomy.
//!
//! Three families reach a page: transport failures (no response),
//! server-reported failures (non-2xx with a message payload) and client
//! validation failures caught before any request is sent. The rest are
//! local bookkeeping errors.

use serde::Deserialize;

/// Message used when a transport failure carries no text of its own.
pub const NETWORK_FALLBACK: &str = "Network error";

/// Message used when a server failure carries no message payload.
pub const REQUEST_FALLBACK: &str = "Request failed";

/// Errors surfaced by every client operation.
///
/// `Clone` so one failed fetch can be handed to every caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        code: Option<String>,
    },
    #[error("Authentication required")]
    Unauthorized,
    #[error("Session expired")]
    SessionExpired,
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Another submission is still pending")]
    MutationPending,
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn validation(field: &str, message: &str) -> Self {
        ClientError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// HTTP status for server-reported errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// Whether the failure happened before a response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// Inline text a page shows next to the failing action.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(msg) if msg.trim().is_empty() => NETWORK_FALLBACK.to_string(),
            ClientError::Server { message, .. } if message.trim().is_empty() => {
                REQUEST_FALLBACK.to_string()
            }
            ClientError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Server failure payload. Either `{error: {message, code}}` or `{message}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorDetail>,
    message: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

/// Build a `Server` error from a non-2xx status and its raw body.
///
/// Message precedence: nested `error.message`, then top-level `message`,
/// then the HTTP reason phrase, then [`REQUEST_FALLBACK`].
pub fn server_error(status: u16, reason: Option<&str>, body: &str) -> ClientError {
    let payload: ErrorPayload = serde_json::from_str(body).unwrap_or_default();
    let nested = payload.error.unwrap_or_default();
    let present = |m: &String| !m.trim().is_empty();
    let message = nested
        .message
        .filter(present)
        .or_else(|| payload.message.filter(present))
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| REQUEST_FALLBACK.to_string());

    ClientError::Server {
        status,
        message,
        code: nested.code.or(payload.code),
    }
}
