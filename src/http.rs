//! Thin JSON client over the REST API.
//!
//! Every call goes through [`HttpClient::send`]: the path is joined onto the
//! base URL, the bearer token from the session is attached, the response
//! envelope `{success, data}` is unwrapped and failures are normalized into
//! [`ClientError`].

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{server_error, ClientError, NETWORK_FALLBACK};
use crate::session::SessionStore;

/// Header carrying a per-request id for correlating client and server logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ═══════════════════════════════════════════════════════════
// QueryParams
// ═══════════════════════════════════════════════════════════

/// Ordered query-string parameters. Blank values are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Display + ?Sized>(mut self, name: &str, value: &T) -> Self {
        let value = value.to_string();
        let value = value.trim();
        if !value.is_empty() {
            self.pairs.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn opt<T: Display + ?Sized>(self, name: &str, value: Option<&T>) -> Self {
        match value {
            Some(v) => self.add(name, v),
            None => self,
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Form-encoded `a=1&b=2`, empty when there are no pairs.
    pub fn to_query_string(&self) -> String {
        let Ok(mut url) = reqwest::Url::parse("http://query.invalid/") else {
            return String::new();
        };
        url.query_pairs_mut().extend_pairs(self.pairs.iter());
        url.query().unwrap_or_default().to_string()
    }
}

/// Percent-encode one path segment (`Blood A+` → `Blood%20A+`).
pub fn path_segment(raw: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://segment.invalid/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}

// ═══════════════════════════════════════════════════════════
// HttpClient
// ═══════════════════════════════════════════════════════════

/// Shared HTTP client. Cheap to clone.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    session: Arc<SessionStore>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            session,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Join base and path with exactly one `/`, then append the query.
    pub fn url(&self, path: &str, params: &QueryParams) -> String {
        let mut url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.to_query_string());
        }
        url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, ClientError> {
        decode(self.get_value(path, params).await?)
    }

    /// Undecoded GET, as stored by the query cache.
    pub async fn get_value(&self, path: &str, params: &QueryParams) -> Result<Value, ClientError> {
        self.send(Method::GET, path, params, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        decode(self.send(Method::POST, path, &QueryParams::new(), Some(body)).await?)
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        decode(self.send(Method::PUT, path, &QueryParams::new(), Some(body)).await?)
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        decode(self.send(Method::PATCH, path, &QueryParams::new(), Some(body)).await?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        decode(self.send(Method::DELETE, path, &QueryParams::new(), None).await?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = self.url(path, params);
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(REQUEST_ID_HEADER, &request_id);
        let token = self.session.access_token();
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, %request_id, "API request");

        let response = request.send().await.map_err(|e| {
            let err = transport_error(&e, self.timeout);
            tracing::warn!(%method, path, error = %err, "API request failed");
            err
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(&e, self.timeout))?;

        if status == StatusCode::UNAUTHORIZED && self.session.is_authenticated() {
            tracing::warn!(%method, path, "Session rejected by server, signing out");
            self.session.clear();
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let err = server_error(status.as_u16(), status.canonical_reason(), &text);
            tracing::warn!(%method, path, status = status.as_u16(), error = %err, "API error");
            return Err(err);
        }

        unwrap_envelope(status.as_u16(), &text)
    }
}

/// Decode an unwrapped payload into the caller's type.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

/// `{success: true, data}` yields `data`; other JSON passes through; an empty
/// body is `null`.
fn unwrap_envelope(status: u16, body: &str) -> Result<Value, ClientError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value: Value = serde_json::from_str(body)?;
    match value {
        Value::Object(mut map) if map.get("success").is_some_and(Value::is_boolean) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                return Err(server_error(status, None, body));
            }
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

fn transport_error(err: &reqwest::Error, timeout: Duration) -> ClientError {
    if err.is_timeout() {
        ClientError::Network(format!("Request timed out after {}s", timeout.as_secs()))
    } else if err.is_connect() {
        ClientError::Network(NETWORK_FALLBACK.to_string())
    } else {
        let text = err.to_string();
        if text.trim().is_empty() {
            ClientError::Network(NETWORK_FALLBACK.to_string())
        } else {
            ClientError::Network(text)
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
