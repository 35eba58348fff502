//! Best-effort scan logging
//!
//! Every scan produces at most one scan log write plus one scan-count increment. The work runs
//! on a detached task: the resolver never waits for it and nothing it does can fail a redirect.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::{NewScanLog, ScanContext};
use crate::storage::Storage;

use super::device::classify_device;
use super::geo::{GeoInfo, GeoLookup};

/// Something that records scans without blocking the caller
pub trait ScanRecorder: Send + Sync {
    fn record(&self, qr_id: &str, context: ScanContext);
}

#[derive(Clone)]
pub struct ScanLogger {
    storage: Arc<dyn Storage>,
    geo: Arc<dyn GeoLookup>,
}

impl ScanLogger {
    pub fn new(storage: Arc<dyn Storage>, geo: Arc<dyn GeoLookup>) -> Self {
        Self { storage, geo }
    }

    /// Spawn the logging work and return immediately.
    ///
    /// The returned handle resolves once the work is done (or has failed and been logged);
    /// dropping it does not cancel anything.
    pub fn log(&self, qr_id: &str, context: ScanContext) -> JoinHandle<()> {
        let logger = self.clone();
        let qr_id = qr_id.to_string();

        tokio::spawn(async move {
            let task_qr_id = qr_id.clone();
            let work = tokio::spawn(async move { logger.write_entry(&task_qr_id, context).await });

            // A panic in a provider must not escape as an unobserved task failure
            if let Err(err) = work.await {
                warn!(qr_id = %qr_id, error = %err, "scan logging task aborted");
            }
        })
    }

    /// Classify, locate and persist one scan; all failures are logged and swallowed.
    pub async fn write_entry(&self, qr_id: &str, context: ScanContext) {
        let device_type = classify_device(context.user_agent.as_deref());

        let geo = match self.geo.lookup(context.client_ip).await {
            Ok(info) => info.or_unknown(),
            Err(err) => {
                warn!(qr_id = %qr_id, provider = self.geo.name(), error = %err, "geo lookup failed, recording unknown location");
                GeoInfo::unknown()
            }
        };

        let (latitude, longitude) = match context.location {
            Some(coords) => (Some(coords.latitude), Some(coords.longitude)),
            None => (geo.latitude, geo.longitude),
        };

        let entry = NewScanLog {
            qr_code_id: qr_id.to_string(),
            device_type,
            referrer: context.referrer.filter(|r| !r.trim().is_empty()),
            country: geo.country,
            city: geo.city,
            latitude,
            longitude,
            user_agent: context.user_agent,
        };

        match self.storage.insert_scan_log(entry).await {
            Ok(saved) => debug!(qr_id = %qr_id, log_id = saved.id, "scan logged"),
            Err(err) => warn!(qr_id = %qr_id, error = %err, "failed to write scan log"),
        }

        if let Err(err) = self.storage.increment_scan_count(qr_id).await {
            warn!(qr_id = %qr_id, error = %err, "failed to increment scan count");
        }
    }
}

impl ScanRecorder for ScanLogger {
    fn record(&self, qr_id: &str, context: ScanContext) {
        // Detached on purpose: the handle is dropped without awaiting
        let _ = self.log(qr_id, context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::geo::{GeoLookupError, UNKNOWN_LOCATION};
    use crate::models::{Coordinates, QrRecord, QrType};
    use crate::storage::SqliteStorage;
    use async_trait::async_trait;
    use std::net::IpAddr;

    struct FixedGeo(GeoInfo);

    #[async_trait]
    impl GeoLookup for FixedGeo {
        async fn lookup(&self, _ip: Option<IpAddr>) -> Result<GeoInfo, GeoLookupError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingGeo;

    #[async_trait]
    impl GeoLookup for FailingGeo {
        async fn lookup(&self, _ip: Option<IpAddr>) -> Result<GeoInfo, GeoLookupError> {
            Err(GeoLookupError::Status(503))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct PanickingGeo;

    #[async_trait]
    impl GeoLookup for PanickingGeo {
        async fn lookup(&self, _ip: Option<IpAddr>) -> Result<GeoInfo, GeoLookupError> {
            panic!("provider exploded");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    async fn storage_with_record(id: &str) -> Arc<dyn Storage> {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        storage
            .create_qr_record(&QrRecord::new(id, QrType::Static).with_destination("example.com"))
            .await
            .unwrap();
        Arc::new(storage)
    }

    #[tokio::test]
    async fn test_log_writes_entry_and_increments() {
        let storage = storage_with_record("qr1").await;
        let geo = FixedGeo(GeoInfo {
            country: Some("Canada".to_string()),
            city: Some("Toronto".to_string()),
            latitude: Some(43.65),
            longitude: Some(-79.38),
        });
        let logger = ScanLogger::new(Arc::clone(&storage), Arc::new(geo));

        let context = ScanContext {
            user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)".to_string()),
            referrer: Some("https://news.example".to_string()),
            ..Default::default()
        };
        logger.log("qr1", context).await.unwrap();

        let logs = storage.list_scan_logs("qr1", 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].device_type, "mobile");
        assert_eq!(logs[0].country.as_deref(), Some("Canada"));
        assert_eq!(logs[0].city.as_deref(), Some("Toronto"));
        assert_eq!(logs[0].latitude, Some(43.65));
        assert_eq!(logs[0].referrer.as_deref(), Some("https://news.example"));

        let record = storage.get_qr_record("qr1").await.unwrap().unwrap();
        assert_eq!(record.scan_count, 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_records_unknown() {
        let storage = storage_with_record("qr2").await;
        let logger = ScanLogger::new(Arc::clone(&storage), Arc::new(FailingGeo));

        let context = ScanContext {
            user_agent: Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()),
            location: Some(Coordinates {
                latitude: 1.0,
                longitude: 2.0,
            }),
            ..Default::default()
        };
        logger.log("qr2", context).await.unwrap();

        let logs = storage.list_scan_logs("qr2", 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].device_type, "desktop");
        assert_eq!(logs[0].country.as_deref(), Some(UNKNOWN_LOCATION));
        assert_eq!(logs[0].city.as_deref(), Some(UNKNOWN_LOCATION));
        assert_eq!(logs[0].latitude, Some(1.0));
        assert_eq!(logs[0].longitude, Some(2.0));
    }

    #[tokio::test]
    async fn test_panicking_provider_is_contained() {
        let storage = storage_with_record("qr3").await;
        let logger = ScanLogger::new(Arc::clone(&storage), Arc::new(PanickingGeo));

        // The outer task completes normally even though the work task panicked
        logger.log("qr3", ScanContext::default()).await.unwrap();

        assert!(storage.list_scan_logs("qr3", 10).await.unwrap().is_empty());
    }
}
