use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedOps";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fallback API root when `MEDOPS_API_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Queries are fresh for one minute after a successful fetch.
const DEFAULT_STALE_SECS: u64 = 60;
/// Unused entries are collected after five minutes.
const DEFAULT_GC_SECS: u64 = 300;
const DEFAULT_QUERY_RETRY: u32 = 1;

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "medops_lib=info,warn"
}

/// Directory holding client state (~/.medops/).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".medops")
}

/// Default location of the persisted session record.
pub fn default_session_file() -> PathBuf {
    app_data_dir().join("session.json")
}

/// Runtime configuration for the HTTP client, cache and session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// How long a successful query result is served without refetching.
    pub stale_time: Duration,
    /// How long an unused cache entry survives `collect_garbage`.
    pub gc_time: Duration,
    /// Retries for queries that fail at the transport level. Mutations never retry.
    pub query_retry: u32,
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            stale_time: Duration::from_secs(DEFAULT_STALE_SECS),
            gc_time: Duration::from_secs(DEFAULT_GC_SECS),
            query_retry: DEFAULT_QUERY_RETRY,
            session_file: default_session_file(),
        }
    }
}

impl ClientConfig {
    /// Build a config from `MEDOPS_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |name: &str, fallback: Duration| -> Duration {
            parse_number::<u64>(&lookup, name)
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        let base_url = lookup("MEDOPS_API_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);

        Self {
            base_url: normalize_base_url(&base_url),
            timeout: secs("MEDOPS_TIMEOUT_SECS", defaults.timeout),
            connect_timeout: secs("MEDOPS_CONNECT_TIMEOUT_SECS", defaults.connect_timeout),
            stale_time: secs("MEDOPS_STALE_SECS", defaults.stale_time),
            gc_time: secs("MEDOPS_GC_SECS", defaults.gc_time),
            query_retry: parse_number::<u32>(&lookup, "MEDOPS_QUERY_RETRY")
                .unwrap_or(defaults.query_retry),
            session_file: lookup("MEDOPS_SESSION_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
        }
    }

    /// Point the config at another API root (tests, staging).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

/// Strip trailing slashes so paths can be appended with a single `/`.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.stale_time, Duration::from_secs(60));
        assert_eq!(config.gc_time, Duration::from_secs(300));
        assert_eq!(config.query_retry, 1);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("MEDOPS_API_BASE_URL", "https://ops.example.org/api/"),
            ("MEDOPS_STALE_SECS", "5"),
            ("MEDOPS_QUERY_RETRY", "0"),
            ("MEDOPS_SESSION_FILE", "/tmp/medops-session.json"),
        ]));
        assert_eq!(config.base_url, "https://ops.example.org/api");
        assert_eq!(config.stale_time, Duration::from_secs(5));
        assert_eq!(config.query_retry, 0);
        assert_eq!(config.session_file, PathBuf::from("/tmp/medops-session.json"));
    }

    #[test]
    fn garbage_numbers_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("MEDOPS_TIMEOUT_SECS", "soon"),
            ("MEDOPS_GC_SECS", "-4"),
        ]));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.gc_time, Duration::from_secs(300));
    }

    #[test]
    fn blank_base_url_uses_default() {
        let config = ClientConfig::from_lookup(lookup_from(&[("MEDOPS_API_BASE_URL", "  ")]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn normalize_strips_trailing_slashes() {
        assert_eq!(normalize_base_url("http://a/api///"), "http://a/api");
        assert_eq!(normalize_base_url("/"), "/");
    }

    #[test]
    fn session_file_under_app_data() {
        assert!(default_session_file().starts_with(app_data_dir()));
        assert!(default_session_file().ends_with("session.json"));
    }

    #[test]
    fn app_name_is_medops() {
        assert_eq!(APP_NAME, "MedOps");
    }
}
