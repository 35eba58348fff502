use crate::models::{NewScanLog, QrAction, QrRecord, ScanLogEntry};
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Read-through cache in front of another storage backend.
///
/// Only the two resolver reads are cached. Writes, including scan count increments, always go
/// straight to the inner store, so the cached `scan_count` of a record may lag behind.
pub struct CachedStorage {
    /// Underlying storage implementation
    inner: Arc<dyn Storage>,
    /// Record lookups, including misses
    records: Cache<String, Option<QrRecord>>,
    /// Active menu actions per record
    menus: Cache<String, Vec<QrAction>>,
}

impl CachedStorage {
    pub fn new(inner: Arc<dyn Storage>, max_cache_entries: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);

        let records = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(ttl)
            .build();
        let menus = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(ttl)
            .build();

        Self {
            inner,
            records,
            menus,
        }
    }

    /// Drop cached state for one record
    async fn invalidate(&self, id: &str) {
        self.records.invalidate(id).await;
        self.menus.invalidate(id).await;
    }
}

#[async_trait]
impl Storage for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn get_qr_record(&self, id: &str) -> Result<Option<QrRecord>> {
        if let Some(cached) = self.records.get(id).await {
            return Ok(cached);
        }

        let result = self.inner.get_qr_record(id).await?;
        self.records.insert(id.to_string(), result.clone()).await;

        Ok(result)
    }

    async fn get_qr_actions(&self, qr_id: &str) -> Result<Vec<QrAction>> {
        if let Some(cached) = self.menus.get(qr_id).await {
            return Ok(cached);
        }

        let actions = self.inner.get_qr_actions(qr_id).await?;
        self.menus.insert(qr_id.to_string(), actions.clone()).await;

        Ok(actions)
    }

    async fn insert_scan_log(&self, entry: NewScanLog) -> Result<ScanLogEntry> {
        self.inner.insert_scan_log(entry).await
    }

    async fn increment_scan_count(&self, id: &str) -> Result<()> {
        self.inner.increment_scan_count(id).await
    }

    async fn create_qr_record(&self, record: &QrRecord) -> StorageResult<QrRecord> {
        let created = self.inner.create_qr_record(record).await?;

        // Replaces a cached miss for the same id
        self.records
            .insert(created.id.clone(), Some(created.clone()))
            .await;

        Ok(created)
    }

    async fn create_qr_action(&self, action: &QrAction) -> StorageResult<QrAction> {
        let created = self.inner.create_qr_action(action).await?;
        self.menus.invalidate(&created.qr_code_id).await;
        Ok(created)
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let result = self.inner.set_active(id, active).await?;

        if result {
            self.invalidate(id).await;
        }

        Ok(result)
    }

    async fn list_scan_logs(&self, qr_id: &str, limit: i64) -> Result<Vec<ScanLogEntry>> {
        self.inner.list_scan_logs(qr_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QrType;
    use crate::storage::SqliteStorage;

    async fn setup() -> (Arc<dyn Storage>, CachedStorage) {
        let sqlite = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        sqlite.init().await.unwrap();
        let inner: Arc<dyn Storage> = Arc::new(sqlite);
        let cached = CachedStorage::new(Arc::clone(&inner), 100, 300);
        (inner, cached)
    }

    #[tokio::test]
    async fn test_deactivation_invalidates_cached_record() {
        let (_inner, cached) = setup().await;
        cached
            .create_qr_record(&QrRecord::new("c1", QrType::Static).with_destination("a.com"))
            .await
            .unwrap();

        assert!(cached.get_qr_record("c1").await.unwrap().unwrap().is_active);

        assert!(cached.set_active("c1", false).await.unwrap());
        assert!(!cached.get_qr_record("c1").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_cached_miss_is_replaced_on_create() {
        let (_inner, cached) = setup().await;
        assert!(cached.get_qr_record("late").await.unwrap().is_none());

        cached
            .create_qr_record(&QrRecord::new("late", QrType::Dynamic).with_destination("b.com"))
            .await
            .unwrap();

        assert!(cached.get_qr_record("late").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_increments_bypass_cache() {
        let (inner, cached) = setup().await;
        cached
            .create_qr_record(&QrRecord::new("c2", QrType::Static).with_destination("a.com"))
            .await
            .unwrap();

        cached.increment_scan_count("c2").await.unwrap();
        cached.increment_scan_count("c2").await.unwrap();

        let stored = inner.get_qr_record("c2").await.unwrap().unwrap();
        assert_eq!(stored.scan_count, 2);
    }
}
