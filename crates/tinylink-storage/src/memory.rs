use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tinylink_core::{AnalyticsRecord, ShortCode, Storage, UrlRecord};
use tracing::trace;

/// Volatile storage living as long as the process, mainly for tests and
/// development.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    urls: DashMap<ShortCode, UrlRecord>,
    analytics: DashMap<ShortCode, Vec<AnalyticsRecord>>,
}

impl InMemoryStorage {
    /// Creates a new in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory storage sized for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            urls: DashMap::with_capacity(capacity),
            analytics: DashMap::with_capacity(capacity),
        }
    }

    /// Drops every record and click.
    pub fn clear(&self) {
        self.urls.clear();
        self.analytics.clear();
    }

    /// Number of stored URL records.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Snapshot of all URL records, ordered by short code.
    pub fn records(&self) -> Vec<UrlRecord> {
        let mut records: Vec<UrlRecord> = self
            .urls
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.short_code().cmp(b.short_code()));
        records
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn store(&self, record: UrlRecord) -> Result<()> {
        trace!(code = %record.short_code(), "storing record in memory");
        self.urls.insert(record.short_code().clone(), record);
        Ok(())
    }

    async fn retrieve(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self.urls.get(code).map(|entry| entry.value().clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.urls.contains_key(code))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        if self.urls.remove(code).is_none() {
            return Ok(false);
        }
        self.analytics.remove(code);
        Ok(true)
    }

    async fn store_analytics(&self, record: AnalyticsRecord) -> Result<()> {
        self.analytics
            .entry(record.short_code().clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn analytics(&self, code: &ShortCode) -> Result<Vec<AnalyticsRecord>> {
        // clicks are appended in arrival order
        Ok(self
            .analytics
            .get(code)
            .map(|clicks| clicks.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
