use crate::models::{NewScanLog, QrAction, QrRecord, ScanLogEntry};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record already exists")]
    Conflict,
    #[error("parent QR record not found")]
    MissingParent,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Get a QR record by id; inactive records are returned too
    async fn get_qr_record(&self, id: &str) -> Result<Option<QrRecord>>;

    /// Active menu actions of a record, ordered by display order
    async fn get_qr_actions(&self, qr_id: &str) -> Result<Vec<QrAction>>;

    /// Append a scan log entry; the store assigns `scanned_at`
    async fn insert_scan_log(&self, entry: NewScanLog) -> Result<ScanLogEntry>;

    /// Atomically add one to the record's scan count
    async fn increment_scan_count(&self, id: &str) -> Result<()>;

    /// Create a QR record; `scan_count` and `created_at` are assigned by the store
    async fn create_qr_record(&self, record: &QrRecord) -> StorageResult<QrRecord>;

    /// Create a menu action under an existing record
    async fn create_qr_action(&self, action: &QrAction) -> StorageResult<QrAction>;

    /// Activate or deactivate a record; false when the record does not exist
    async fn set_active(&self, id: &str, active: bool) -> Result<bool>;

    /// Most recent scan log entries of a record, newest first
    async fn list_scan_logs(&self, qr_id: &str, limit: i64) -> Result<Vec<ScanLogEntry>>;
}
