use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, TelemetryStore};
use crate::domain::KeyedHistory;

/// Process-local store, used when no database is configured.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<KeyedHistory>,
}

impl InMemoryStore {
    pub fn with_entries(entries: KeyedHistory) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TelemetryStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn fetch_since(&self, start_ts: i64) -> Result<KeyedHistory, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, s)| s.timestamp >= start_ts)
            .map(|(k, s)| (k.clone(), s.clone()))
            .collect())
    }

    async fn write_batch(&self, batch: KeyedHistory) -> Result<usize, StoreError> {
        let written = batch.len();
        self.entries.write().await.extend(batch);
        Ok(written)
    }
}
