//! Scan analytics
//!
//! Device classification, client IP extraction, geolocation providers and the detached
//! scan logger that records one entry per resolved scan.

pub mod device;
pub mod geo;
pub mod geoip;
pub mod http_lookup;
pub mod ip_extractor;
pub mod logger;

use std::sync::Arc;
use tracing::{info, warn};

pub use device::classify_device;
pub use geo::{GeoInfo, GeoLookup, GeoLookupError, UNKNOWN_LOCATION};
pub use geoip::MaxMindGeoLookup;
pub use http_lookup::HttpGeoLookup;
pub use ip_extractor::extract_client_ip;
pub use logger::{ScanLogger, ScanRecorder};

use crate::config::AnalyticsConfig;

/// Pick the geo provider: a readable MaxMind database wins, otherwise the HTTP API.
pub fn geo_lookup_from_config(config: &AnalyticsConfig) -> Arc<dyn GeoLookup> {
    let provider: Arc<dyn GeoLookup> = match config.geoip_city_db.as_deref() {
        Some(path) => match MaxMindGeoLookup::open(path) {
            Ok(lookup) => Arc::new(lookup),
            Err(e) => {
                warn!(
                    "Failed to load GeoIP database at {}: {:#}, falling back to HTTP lookup",
                    path, e
                );
                Arc::new(HttpGeoLookup::new(&config.geo_lookup_url))
            }
        },
        None => Arc::new(HttpGeoLookup::new(&config.geo_lookup_url)),
    };

    info!("Geo lookup provider: {}", provider.name());
    provider
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_geoip_database_falls_back_to_http() {
        let config = AnalyticsConfig {
            geoip_city_db: Some("/nonexistent/GeoLite2-City.mmdb".to_string()),
            ..Default::default()
        };
        assert_eq!(geo_lookup_from_config(&config).name(), "http");
        assert_eq!(geo_lookup_from_config(&AnalyticsConfig::default()).name(), "http");
    }
}
