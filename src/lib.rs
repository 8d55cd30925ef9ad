pub mod cache; // keyed query cache, in-flight de-duplication
pub mod config;
pub mod error;
pub mod export; // inventory transactions CSV
pub mod http; // REST wrapper, envelope unwrapping
pub mod listing;
pub mod models;
pub mod mutation;
pub mod routes; // client route table, auth gating
pub mod services;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use cache::{QueryCache, QueryKey};
pub use config::ClientConfig;
pub use error::ClientError;
pub use services::MedOps;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over the default filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
    if result.is_ok() {
        tracing::info!("{} client v{}", config::APP_NAME, config::APP_VERSION);
    }
}
