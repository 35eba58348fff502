use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Dispatch key of a QR record.
///
/// Values outside the known set are kept verbatim in `Unknown` so that records written by newer
/// editors still resolve (as a direct destination URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QrType {
    Static,
    Dynamic,
    MultiUrl,
    Action,
    Geo,
    MultiAction,
    Vcard,
    Text,
    Event,
    Unknown(String),
}

impl QrType {
    pub fn parse(value: &str) -> Self {
        match value {
            "static" => QrType::Static,
            "dynamic" => QrType::Dynamic,
            "multi-url" => QrType::MultiUrl,
            "action" => QrType::Action,
            "geo" => QrType::Geo,
            "multi-action" => QrType::MultiAction,
            "vcard" => QrType::Vcard,
            "text" => QrType::Text,
            "event" => QrType::Event,
            other => QrType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            QrType::Static => "static",
            QrType::Dynamic => "dynamic",
            QrType::MultiUrl => "multi-url",
            QrType::Action => "action",
            QrType::Geo => "geo",
            QrType::MultiAction => "multi-action",
            QrType::Vcard => "vcard",
            QrType::Text => "text",
            QrType::Event => "event",
            QrType::Unknown(other) => other,
        }
    }
}

impl From<String> for QrType {
    fn from(value: String) -> Self {
        QrType::parse(&value)
    }
}

impl From<QrType> for String {
    fn from(value: QrType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for QrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted candidate of a multi-url record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiUrl {
    pub url: String,
    #[serde(default, deserialize_with = "lenient_weight")]
    pub weight: Option<f64>,
}

impl MultiUrl {
    pub fn new(url: impl Into<String>, weight: Option<f64>) -> Self {
        Self {
            url: url.into(),
            weight,
        }
    }

    /// Weight used for selection; absent, non-positive or non-finite weights count as 1.
    pub fn effective_weight(&self) -> f64 {
        match self.weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => 1.0,
        }
    }
}

/// Accepts numbers and numeric strings; anything else decodes as "no weight".
fn lenient_weight<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Location payload of a geo record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoData {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
}

impl GeoData {
    /// Trimmed address, if any non-blank one is set
    pub fn address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Both coordinates, only when both are present and finite
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }
}

/// The stored configuration a scan resolves against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrRecord {
    pub id: String,
    pub qr_type: QrType,
    pub is_active: bool,
    pub destination_url: Option<String>,
    #[serde(default)]
    pub multi_urls: Vec<MultiUrl>,
    pub action_type: Option<String>,
    pub action_data: Option<Value>,
    pub geo_data: Option<GeoData>,
    #[serde(default)]
    pub scan_count: i64,
    #[serde(default)]
    pub created_at: i64,
}

impl QrRecord {
    /// A fresh, active record of the given type with no payload
    pub fn new(id: impl Into<String>, qr_type: QrType) -> Self {
        Self {
            id: id.into(),
            qr_type,
            is_active: true,
            destination_url: None,
            multi_urls: Vec::new(),
            action_type: None,
            action_data: None,
            geo_data: None,
            scan_count: 0,
            created_at: 0,
        }
    }

    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination_url = Some(url.into());
        self
    }

    pub fn with_multi_urls(mut self, urls: Vec<MultiUrl>) -> Self {
        self.multi_urls = urls;
        self
    }

    pub fn with_action(mut self, action_type: impl Into<String>, action_data: Value) -> Self {
        self.action_type = Some(action_type.into());
        self.action_data = Some(action_data);
        self
    }

    pub fn with_geo(mut self, geo: GeoData) -> Self {
        self.geo_data = Some(geo);
        self
    }

    /// Destination URL, if one is set and not blank
    pub fn destination(&self) -> Option<&str> {
        self.destination_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Raw `qr_codes` row; JSON payload columns are still text here
#[derive(Debug, Clone, FromRow)]
pub struct QrRecordRow {
    pub id: String,
    pub qr_type: String,
    pub is_active: bool,
    pub destination_url: Option<String>,
    pub multi_urls: Option<String>,
    pub action_type: Option<String>,
    pub action_data: Option<String>,
    pub geo_data: Option<String>,
    pub scan_count: i64,
    pub created_at: i64,
}

impl From<QrRecordRow> for QrRecord {
    fn from(row: QrRecordRow) -> Self {
        let multi_urls = row
            .multi_urls
            .as_deref()
            .map(|raw| decode_multi_urls(&row.id, raw))
            .unwrap_or_default();

        let action_data = row
            .action_data
            .as_deref()
            .and_then(|raw| decode_column(&row.id, "action_data", raw));

        let geo_data = row
            .geo_data
            .as_deref()
            .and_then(|raw| decode_column(&row.id, "geo_data", raw));

        QrRecord {
            qr_type: QrType::parse(&row.qr_type),
            id: row.id,
            is_active: row.is_active,
            destination_url: row.destination_url,
            multi_urls,
            action_type: row.action_type,
            action_data,
            geo_data,
            scan_count: row.scan_count,
            created_at: row.created_at,
        }
    }
}

fn decode_column<T: serde::de::DeserializeOwned>(id: &str, column: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(qr_id = %id, column, error = %err, "undecodable payload column, treating as absent");
            None
        }
    }
}

/// Decode the candidate list entry by entry so one broken entry does not hide the others.
fn decode_multi_urls(id: &str, raw: &str) -> Vec<MultiUrl> {
    let Some(entries) = decode_column::<Vec<Value>>(id, "multi_urls", raw) else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<MultiUrl>(entry) {
            Ok(candidate) => Some(candidate),
            Err(err) => {
                tracing::warn!(qr_id = %id, error = %err, "skipping multi-url entry without a url");
                None
            }
        })
        .collect()
}
