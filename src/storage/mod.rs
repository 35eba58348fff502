pub mod cached;
pub mod postgres;
pub mod sqlite;
pub mod trait_def;

pub use cached::CachedStorage;
pub use postgres::PostgresStorage;
pub use sqlite::SqliteStorage;
pub use trait_def::{Storage, StorageError, StorageResult};

use crate::models::QrRecord;

pub(crate) fn now_secs() -> anyhow::Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64)
}

/// JSON text for the payload columns of a record
pub(crate) struct EncodedPayloads {
    pub multi_urls: Option<String>,
    pub action_data: Option<String>,
    pub geo_data: Option<String>,
}

impl EncodedPayloads {
    pub fn from_record(record: &QrRecord) -> anyhow::Result<Self> {
        let multi_urls = if record.multi_urls.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&record.multi_urls)?)
        };
        let action_data = record
            .action_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let geo_data = record
            .geo_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            multi_urls,
            action_data,
            geo_data,
        })
    }
}

/// Unique-constraint violations map to `Conflict`, everything else is passed on
pub(crate) fn map_insert_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db_err.is_foreign_key_violation() {
            return StorageError::MissingParent;
        }
    }
    StorageError::Other(err.into())
}
