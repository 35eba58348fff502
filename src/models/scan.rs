use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::net::IpAddr;

/// Coarse device class derived from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What the scanning client told us about itself
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    /// Coarse location reported by the client, if it shared one
    pub location: Option<Coordinates>,
    /// Client address used for the IP geolocation lookup
    pub client_ip: Option<IpAddr>,
}

/// Scan log row to be written; `scanned_at` is assigned by the store
#[derive(Debug, Clone)]
pub struct NewScanLog {
    pub qr_code_id: String,
    pub device_type: DeviceType,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub user_agent: Option<String>,
}

/// Persisted, append-only scan telemetry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScanLogEntry {
    pub id: i64,
    pub qr_code_id: String,
    pub scanned_at: i64,
    pub device_type: String,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub user_agent: Option<String>,
}
