//! In-process mock backend for async tests.
//!
//! Binds an axum router to `127.0.0.1:0`, records every request it sees and
//! shuts down when dropped.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::Request;
use axum::middleware::Next;
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    /// Path plus query string, as sent.
    pub uri: String,
    pub authorization: Option<String>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<Recorded>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    pub async fn start(router: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");

        let log = Arc::new(Mutex::new(Vec::new()));
        let recorder = log.clone();
        let app = router.layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            let recorder = recorder.clone();
            async move {
                let entry = Recorded {
                    method: req.method().to_string(),
                    uri: req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.to_string())
                        .unwrap_or_default(),
                    authorization: req
                        .headers()
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                };
                recorder.lock().unwrap().push(entry);
                next.run(req).await
            }
        }));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            log,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default().with_base_url(&self.base_url())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    /// Requests whose path (without query) equals `path`.
    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.uri.split('?').next() == Some(path))
            .count()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// `{success: true, data}` envelope.
pub fn ok(data: Value) -> axum::Json<Value> {
    axum::Json(json!({ "success": true, "data": data }))
}

pub fn user_json(id: &str, email: &str, role: &str) -> Value {
    json!({ "id": id, "email": email, "role": role, "firstName": "Ada", "lastName": "Okafor" })
}
