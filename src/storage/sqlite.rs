use crate::models::{NewScanLog, QrAction, QrActionRow, QrRecord, QrRecordRow, ScanLogEntry};
use crate::storage::{
    map_insert_error, now_secs, EncodedPayloads, Storage, StorageError, StorageResult,
};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

const RECORD_COLUMNS: &str = "id, qr_type, is_active, destination_url, multi_urls, action_type, action_data, geo_data, scan_count, created_at";

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qr_codes (
                id TEXT PRIMARY KEY,
                qr_type TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                destination_url TEXT,
                multi_urls TEXT,
                action_type TEXT,
                action_data TEXT,
                geo_data TEXT,
                scan_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qr_actions (
                id TEXT PRIMARY KEY,
                qr_code_id TEXT NOT NULL REFERENCES qr_codes(id) ON DELETE CASCADE,
                action_type TEXT NOT NULL,
                action_data TEXT,
                display_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_qr_actions_qr_code ON qr_actions(qr_code_id, display_order)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scan_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                qr_code_id TEXT NOT NULL,
                scanned_at INTEGER NOT NULL,
                device_type TEXT NOT NULL,
                referrer TEXT,
                country TEXT,
                city TEXT,
                latitude REAL,
                longitude REAL,
                user_agent TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_scan_logs_qr_code ON scan_logs(qr_code_id, scanned_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn get_qr_record(&self, id: &str) -> Result<Option<QrRecord>> {
        let row = sqlx::query_as::<_, QrRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM qr_codes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(QrRecord::from))
    }

    async fn get_qr_actions(&self, qr_id: &str) -> Result<Vec<QrAction>> {
        let rows = sqlx::query_as::<_, QrActionRow>(
            r#"
            SELECT id, qr_code_id, action_type, action_data, display_order, is_active
            FROM qr_actions
            WHERE qr_code_id = ? AND is_active = 1
            ORDER BY display_order ASC, id ASC
            "#,
        )
        .bind(qr_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(QrAction::from).collect())
    }

    async fn insert_scan_log(&self, entry: NewScanLog) -> Result<ScanLogEntry> {
        let scanned_at = now_secs()?;

        let saved = sqlx::query_as::<_, ScanLogEntry>(
            r#"
            INSERT INTO scan_logs
                (qr_code_id, scanned_at, device_type, referrer, country, city, latitude, longitude, user_agent)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, qr_code_id, scanned_at, device_type, referrer, country, city, latitude, longitude, user_agent
            "#,
        )
        .bind(&entry.qr_code_id)
        .bind(scanned_at)
        .bind(entry.device_type.as_str())
        .bind(&entry.referrer)
        .bind(&entry.country)
        .bind(&entry.city)
        .bind(entry.latitude)
        .bind(entry.longitude)
        .bind(&entry.user_agent)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(saved)
    }

    async fn increment_scan_count(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE qr_codes
            SET scan_count = scan_count + 1
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_qr_record(&self, record: &QrRecord) -> StorageResult<QrRecord> {
        let created_at = now_secs()?;
        let payloads = EncodedPayloads::from_record(record)?;

        let row = sqlx::query_as::<_, QrRecordRow>(&format!(
            r#"
            INSERT INTO qr_codes
                (id, qr_type, is_active, destination_url, multi_urls, action_type, action_data, geo_data, scan_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(&record.id)
        .bind(record.qr_type.as_str())
        .bind(record.is_active)
        .bind(&record.destination_url)
        .bind(&payloads.multi_urls)
        .bind(&record.action_type)
        .bind(&payloads.action_data)
        .bind(&payloads.geo_data)
        .bind(created_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_insert_error)?;

        Ok(QrRecord::from(row))
    }

    async fn create_qr_action(&self, action: &QrAction) -> StorageResult<QrAction> {
        if self.get_qr_record(&action.qr_code_id).await?.is_none() {
            return Err(StorageError::MissingParent);
        }

        let action_data =
            serde_json::to_string(&action.action_data).map_err(|e| StorageError::Other(e.into()))?;

        let row = sqlx::query_as::<_, QrActionRow>(
            r#"
            INSERT INTO qr_actions (id, qr_code_id, action_type, action_data, display_order, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, qr_code_id, action_type, action_data, display_order, is_active
            "#,
        )
        .bind(&action.id)
        .bind(&action.qr_code_id)
        .bind(action.action_type.as_str())
        .bind(action_data)
        .bind(action.display_order)
        .bind(action.is_active)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_insert_error)?;

        Ok(QrAction::from(row))
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE qr_codes
            SET is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(active)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_scan_logs(&self, qr_id: &str, limit: i64) -> Result<Vec<ScanLogEntry>> {
        let logs = sqlx::query_as::<_, ScanLogEntry>(
            r#"
            SELECT id, qr_code_id, scanned_at, device_type, referrer, country, city, latitude, longitude, user_agent
            FROM scan_logs
            WHERE qr_code_id = ?
            ORDER BY scanned_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(qr_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(logs)
    }
}
