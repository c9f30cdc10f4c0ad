//! Telemetry storage
//!
//! Hardware pushes samples into a realtime database under a single path; the
//! backend reads time windows out of it and bulk-writes synthetic history.

pub mod memory;
pub mod realtime_db;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::domain::KeyedHistory;

pub use memory::InMemoryStore;
pub use realtime_db::RealtimeDbStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("telemetry store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telemetry store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The database refuses ordered queries on unindexed children.
    #[error("telemetry store index missing: {0}")]
    Index(String),

    #[error("telemetry store response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;

    /// All samples with `timestamp >= start_ts`.
    async fn fetch_since(&self, start_ts: i64) -> Result<KeyedHistory, StoreError>;

    /// Merge `batch` into the store, leaving other keys untouched. Returns the
    /// number of entries written.
    async fn write_batch(&self, batch: KeyedHistory) -> Result<usize, StoreError>;
}

pub fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn TelemetryStore>, StoreError> {
    match cfg.database_url.as_deref() {
        Some(url) => {
            info!(url, path = %cfg.path, "using realtime database telemetry store");
            Ok(Arc::new(RealtimeDbStore::new(url, cfg)?))
        }
        None => {
            warn!("store.database_url not set, telemetry is kept in memory only");
            Ok(Arc::new(InMemoryStore::default()))
        }
    }
}
