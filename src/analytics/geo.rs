//! IP geolocation capability used by the scan logger

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;

/// Value recorded when a location field cannot be determined
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Coarse location of a client address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoInfo {
    /// Both fields set to "Unknown", used whenever a lookup fails
    pub fn unknown() -> Self {
        Self {
            country: Some(UNKNOWN_LOCATION.to_string()),
            city: Some(UNKNOWN_LOCATION.to_string()),
            latitude: None,
            longitude: None,
        }
    }

    /// Fill missing country/city with "Unknown"
    pub fn or_unknown(mut self) -> Self {
        if self.country.as_deref().is_none_or(str::is_empty) {
            self.country = Some(UNKNOWN_LOCATION.to_string());
        }
        if self.city.as_deref().is_none_or(str::is_empty) {
            self.city = Some(UNKNOWN_LOCATION.to_string());
        }
        self
    }
}

#[derive(Debug, Error)]
pub enum GeoLookupError {
    #[error("geo lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geo lookup returned HTTP {0}")]
    Status(u16),
    #[error("geo lookup rejected the query: {0}")]
    Rejected(String),
    #[error("no geo data for this address")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Lookup of a client's coarse location.
///
/// `None` asks the provider to locate the caller's own address, where that is supported.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip: Option<IpAddr>) -> Result<GeoInfo, GeoLookupError>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}
