//! Keyed query cache.
//!
//! Entries are addressed by a [`QueryKey`] (an ordered list of JSON values)
//! and hold the last fetched payload. A fresh entry is served without a
//! request; concurrent reads of one key share a single in-flight fetch;
//! invalidation by key prefix forces the next read to refetch.
//!
//! The entry map sits behind a `std::sync::Mutex` that is never held across
//! an `.await`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::decode;

/// Delay before the first retry of a failed query; doubles per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

// ═══════════════════════════════════════════════════════════
// QueryKey
// ═══════════════════════════════════════════════════════════

/// Ordered cache key, e.g. `["appointments", {"status": "scheduled"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        Self(vec![Value::String(root.to_string())])
    }

    pub fn from_parts(parts: Vec<Value>) -> Self {
        Self(parts)
    }

    /// Append one segment. Filters serialize to objects without unset fields.
    pub fn with<T: Serialize + ?Sized>(mut self, part: &T) -> Self {
        self.0.push(key_part(part));
        self
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    /// Element-wise prefix match.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        prefix.0.len() <= self.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }

    /// Stable map key. Object members serialize in sorted order.
    fn id(&self) -> String {
        Value::Array(self.0.clone()).to_string()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Convert one key segment. Unserializable values become `null`.
pub fn key_part<T: Serialize + ?Sized>(part: &T) -> Value {
    serde_json::to_value(part).unwrap_or(Value::Null)
}

/// Build a [`QueryKey`] from any serializable segments.
///
/// ```ignore
/// let key = query_key!["patients", patient_id, "appointments"];
/// ```
#[macro_export]
macro_rules! query_key {
    ($($part:expr),+ $(,)?) => {
        $crate::cache::QueryKey::from_parts(vec![$($crate::cache::key_part(&$part)),+])
    };
}

// ═══════════════════════════════════════════════════════════
// Entries
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>, ClientError>>>;

struct Entry {
    key: QueryKey,
    status: QueryStatus,
    data: Option<Arc<Value>>,
    error: Option<ClientError>,
    updated_at: Option<Instant>,
    last_access: Instant,
    invalidated: bool,
    /// Bumped by every invalidation.
    generation: u64,
    /// `generation` when the in-flight fetch started.
    fetch_generation: u64,
    in_flight: Option<SharedFetch>,
}

impl Entry {
    fn new(key: QueryKey, now: Instant) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            last_access: now,
            invalidated: false,
            generation: 0,
            fetch_generation: 0,
            in_flight: None,
        }
    }

    fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        self.invalidated
            || self.status != QueryStatus::Success
            || self
                .updated_at
                .map_or(true, |at| now.saturating_duration_since(at) >= stale_time)
    }
}

// ═══════════════════════════════════════════════════════════
// QueryCache
// ═══════════════════════════════════════════════════════════

pub struct QueryCache {
    entries: Mutex<HashMap<String, Entry>>,
    stale_time: Duration,
    gc_time: Duration,
    retry: u32,
}

impl QueryCache {
    pub fn new(stale_time: Duration, gc_time: Duration, retry: u32) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_time,
            gc_time,
            retry,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.stale_time, config.gc_time, config.query_retry)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read through the cache and decode into `T`.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let value = self.fetch_value(key, fetcher).await?;
        decode(Value::clone(&value))
    }

    /// Read through the cache without decoding.
    ///
    /// Fresh data is returned as-is. Otherwise the caller joins the fetch in
    /// flight for this key, or starts one.
    pub async fn fetch_value<F, Fut>(
        &self,
        key: &QueryKey,
        fetcher: F,
    ) -> Result<Arc<Value>, ClientError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.lock();
            let now = Instant::now();
            let entry = entries
                .entry(key.id())
                .or_insert_with(|| Entry::new(key.clone(), now));
            entry.last_access = now;

            if !entry.is_stale(now, self.stale_time) {
                if let Some(data) = &entry.data {
                    tracing::trace!(%key, "Query cache hit");
                    return Ok(data.clone());
                }
            }

            match &entry.in_flight {
                Some(in_flight) => {
                    tracing::trace!(%key, "Joining in-flight query");
                    in_flight.clone()
                }
                None => {
                    tracing::debug!(%key, "Fetching query");
                    let fut = run_with_retry(fetcher, self.retry, key.clone())
                        .boxed()
                        .shared();
                    entry.in_flight = Some(fut.clone());
                    entry.fetch_generation = entry.generation;
                    entry.status = QueryStatus::Loading;
                    fut
                }
            }
        };

        let result = shared.clone().await;
        self.record(key, &shared, &result);
        result
    }

    /// Store a finished fetch. Only the first caller to finish records it.
    fn record(
        &self,
        key: &QueryKey,
        fetch: &SharedFetch,
        result: &Result<Arc<Value>, ClientError>,
    ) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&key.id()) else {
            return;
        };
        let same_fetch = entry
            .in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(fetch));
        if !same_fetch {
            return;
        }
        entry.in_flight = None;
        let now = Instant::now();
        entry.last_access = now;
        match result {
            Ok(value) => {
                entry.status = QueryStatus::Success;
                entry.data = Some(value.clone());
                entry.error = None;
                entry.updated_at = Some(now);
                entry.invalidated = entry.generation != entry.fetch_generation;
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "Query failed");
                entry.status = QueryStatus::Error;
                entry.error = Some(err.clone());
            }
        }
    }

    /// Mark every entry under `prefix` stale. Returns how many matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let mut count = 0;
        for entry in entries.values_mut().filter(|e| e.key.starts_with(prefix)) {
            entry.invalidated = true;
            entry.generation += 1;
            count += 1;
        }
        tracing::debug!(%prefix, count, "Invalidated queries");
        count
    }

    /// Write data directly, e.g. after a mutation returns the new record.
    pub fn set_data<T: Serialize + ?Sized>(
        &self,
        key: &QueryKey,
        value: &T,
    ) -> Result<(), ClientError> {
        let value = serde_json::to_value(value)?;
        let now = Instant::now();
        let mut entries = self.lock();
        let entry = entries
            .entry(key.id())
            .or_insert_with(|| Entry::new(key.clone(), now));
        entry.status = QueryStatus::Success;
        entry.data = Some(Arc::new(value));
        entry.error = None;
        entry.updated_at = Some(now);
        entry.last_access = now;
        entry.invalidated = false;
        Ok(())
    }

    /// Cached data for `key`, stale or not.
    pub fn get_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let data = self.lock().get(&key.id())?.data.clone()?;
        decode(Value::clone(&data)).ok()
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.lock()
            .get(&key.id())
            .map_or(QueryStatus::Idle, |e| e.status)
    }

    /// Last recorded error, cleared by the next success.
    pub fn error(&self, key: &QueryKey) -> Option<ClientError> {
        self.lock().get(&key.id()).and_then(|e| e.error.clone())
    }

    /// Unknown keys count as stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock()
            .get(&key.id())
            .map_or(true, |e| e.is_stale(Instant::now(), self.stale_time))
    }

    /// Drop every entry under `prefix`.
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.key.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop entries unused for longer than the GC window.
    pub fn collect_garbage(&self) -> usize {
        self.collect_garbage_at(Instant::now())
    }

    pub fn collect_garbage_at(&self, now: Instant) -> usize {
        let gc_time = self.gc_time;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| {
            e.in_flight.is_some() || now.saturating_duration_since(e.last_access) < gc_time
        });
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Collected idle queries");
        }
        dropped
    }
}

async fn run_with_retry<F, Fut>(
    fetcher: F,
    retries: u32,
    key: QueryKey,
) -> Result<Arc<Value>, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Value, ClientError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(Arc::new(value)),
            Err(err) if err.is_network() && attempt < retries => {
                attempt += 1;
                tracing::debug!(%key, attempt, error = %err, "Retrying query");
                tokio::time::sleep(RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(60), Duration::from_secs(300), 1)
    }

    fn counting(
        calls: &Arc<AtomicUsize>,
        value: Value,
    ) -> impl Fn() -> BoxFuture<'static, Result<Value, ClientError>> + Send + 'static {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let value = value.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[test]
    fn keys_compare_by_prefix() {
        let root = QueryKey::new("patients");
        let filtered = query_key!["patients", json!({"search": "ada"})];
        let by_id = QueryKey::new("patients").with("7");
        let other = QueryKey::new("patient-notes");

        assert!(filtered.starts_with(&root));
        assert!(by_id.starts_with(&root));
        assert!(!other.starts_with(&root));
        assert!(!root.starts_with(&by_id));
        assert_eq!(by_id.to_string(), r#"["patients","7"]"#);
    }

    #[test]
    fn equal_filters_give_equal_keys() {
        #[derive(Serialize)]
        struct F {
            #[serde(skip_serializing_if = "Option::is_none")]
            a: Option<u8>,
            b: &'static str,
        }
        let one = query_key!["rooms", F { a: None, b: "x" }];
        let two = QueryKey::new("rooms").with(&json!({"b": "x"}));
        assert_eq!(one, two);
    }

    #[tokio::test]
    async fn fresh_entry_served_from_cache() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("rooms");

        let first: Vec<u32> = cache.fetch(&key, counting(&calls, json!([1, 2]))).await.unwrap();
        let second: Vec<u32> = cache.fetch(&key, counting(&calls, json!([9]))).await.unwrap();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(second, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status(&key), QueryStatus::Success);
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_call() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("doctors");

        let (a, b) = tokio::join!(
            cache.fetch::<Value, _, _>(&key, counting(&calls, json!(["d1"]))),
            cache.fetch::<Value, _, _>(&key, counting(&calls, json!(["d1"]))),
        );
        assert_eq!(a.unwrap(), json!(["d1"]));
        assert_eq!(b.unwrap(), json!(["d1"]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_marks_prefix_stale() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let list = query_key!["patients", json!({"search": "ada"})];
        let detail = query_key!["patients", "7"];
        let notes = query_key!["patient-notes"];
        for key in [&list, &detail, &notes] {
            let _: Value = cache.fetch(key, counting(&calls, json!({}))).await.unwrap();
        }

        assert_eq!(cache.invalidate(&QueryKey::new("patients")), 2);
        assert!(cache.is_stale(&list));
        assert!(cache.is_stale(&detail));
        assert!(!cache.is_stale(&notes));

        let _: Value = cache.fetch(&detail, counting(&calls, json!({"id": "7"}))).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(!cache.is_stale(&detail));
    }

    #[tokio::test]
    async fn invalidated_while_in_flight_records_stale() {
        let cache = Arc::new(cache());
        let gate = Arc::new(Notify::new());
        let key = QueryKey::new("appointments");

        let task = {
            let cache = cache.clone();
            let gate = gate.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .fetch::<Value, _, _>(&key, move || {
                        let gate = gate.clone();
                        async move {
                            gate.notified().await;
                            Ok(json!("old"))
                        }
                    })
                    .await
            })
        };

        while cache.status(&key) != QueryStatus::Loading {
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.invalidate(&key), 1);
        gate.notify_one();

        assert_eq!(task.await.unwrap().unwrap(), json!("old"));
        assert!(cache.is_stale(&key));
    }

    #[tokio::test]
    async fn errors_are_recorded_and_returned() {
        let cache = cache();
        let key = QueryKey::new("stats");
        let err = cache
            .fetch::<Value, _, _>(&key, || async {
                Err(ClientError::Server {
                    status: 500,
                    message: "boom".into(),
                    code: None,
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "boom");
        assert_eq!(cache.status(&key), QueryStatus::Error);
        assert_eq!(cache.error(&key), Some(err));
    }

    #[tokio::test]
    async fn network_errors_retry_once() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let key = QueryKey::new("inventory");

        let value: Value = cache
            .fetch(&key, move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ClientError::Network("reset".into()))
                    } else {
                        Ok(json!([]))
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, json!([]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn server_errors_do_not_retry() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let _ = cache
            .fetch::<Value, _, _>(&QueryKey::new("rooms"), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ClientError::Server {
                        status: 400,
                        message: "bad".into(),
                        code: None,
                    })
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_and_get_data() {
        let cache = cache();
        let key = query_key!["room", "r1"];
        assert_eq!(cache.status(&key), QueryStatus::Idle);
        assert!(cache.get_data::<Value>(&key).is_none());

        cache.set_data(&key, &json!({"id": "r1"})).unwrap();
        assert_eq!(cache.get_data::<Value>(&key), Some(json!({"id": "r1"})));
        assert!(!cache.is_stale(&key));
    }

    #[test]
    fn remove_and_clear() {
        let cache = cache();
        cache.set_data(&query_key!["rooms", 1], &1).unwrap();
        cache.set_data(&query_key!["rooms", 2], &2).unwrap();
        cache.set_data(&query_key!["users"], &3).unwrap();

        assert_eq!(cache.remove(&QueryKey::new("rooms")), 2);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn garbage_collection_drops_idle_entries() {
        let cache = cache();
        cache.set_data(&QueryKey::new("users"), &json!([])).unwrap();

        assert_eq!(cache.collect_garbage_at(Instant::now() + Duration::from_secs(10)), 0);
        assert_eq!(cache.collect_garbage_at(Instant::now() + Duration::from_secs(301)), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn garbage_collection_keeps_entries_with_fetch_in_flight() {
        let cache = Arc::new(cache());
        let gate = Arc::new(Notify::new());
        let key = QueryKey::new("staff");

        let task = {
            let cache = cache.clone();
            let gate = gate.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .fetch::<Value, _, _>(&key, move || {
                        let gate = gate.clone();
                        async move {
                            gate.notified().await;
                            Ok(json!(["s1"]))
                        }
                    })
                    .await
            })
        };

        while cache.status(&key) != QueryStatus::Loading {
            tokio::task::yield_now().await;
        }
        let far_future = Instant::now() + Duration::from_secs(301);
        assert_eq!(cache.collect_garbage_at(far_future), 0);
        assert_eq!(cache.len(), 1);

        gate.notify_one();
        assert_eq!(task.await.unwrap().unwrap(), json!(["s1"]));
        assert_eq!(cache.status(&key), QueryStatus::Success);
        assert_eq!(cache.get_data::<Value>(&key), Some(json!(["s1"])));
    }
}
