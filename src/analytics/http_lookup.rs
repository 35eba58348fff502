//! Geo lookup over a public IP-geolocation HTTP API
//!
//! The endpoint is a URL template with an `{ip}` placeholder (e.g. `https://ipapi.co/{ip}/json/`
//! or `http://ip-api.com/json/{ip}`). Successful answers are kept in a small per-address cache.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;
use tracing::trace;

use super::geo::{GeoInfo, GeoLookup, GeoLookupError};

const CACHE_TTL_SECS: u64 = 15 * 60;
const CACHE_MAX_CAPACITY: u64 = 10_000;

pub struct HttpGeoLookup {
    client: Client,
    url_template: String,
    cache: Cache<IpAddr, GeoInfo>,
}

impl HttpGeoLookup {
    pub fn new(url_template: &str) -> Self {
        Self::with_client(Client::new(), url_template)
    }

    pub fn with_client(client: Client, url_template: &str) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
            .max_capacity(CACHE_MAX_CAPACITY)
            .build();

        Self {
            client,
            url_template: url_template.to_string(),
            cache,
        }
    }

    fn url_for(&self, ip: Option<IpAddr>) -> String {
        match ip {
            Some(ip) => self.url_template.replace("{ip}", &ip.to_string()),
            None => self.url_template.replace("{ip}/", "").replace("{ip}", ""),
        }
    }

    async fn fetch(&self, ip: Option<IpAddr>) -> Result<GeoInfo, GeoLookupError> {
        let url = self.url_for(ip);
        trace!(%url, "geo lookup request");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoLookupError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        parse_geo_response(&body)
    }
}

/// Accepts the field names used by the common free providers
fn parse_geo_response(body: &Value) -> Result<GeoInfo, GeoLookupError> {
    if body["error"].as_bool() == Some(true) || body["status"].as_str() == Some("fail") {
        let reason = body["reason"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unspecified")
            .to_string();
        return Err(GeoLookupError::Rejected(reason));
    }

    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| body[*key].as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };
    let number = |keys: &[&str]| keys.iter().find_map(|key| body[*key].as_f64());

    Ok(GeoInfo {
        country: text(&["country_name", "country", "countryCode", "country_code"]),
        city: text(&["city"]),
        latitude: number(&["latitude", "lat"]),
        longitude: number(&["longitude", "lon"]),
    })
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn lookup(&self, ip: Option<IpAddr>) -> Result<GeoInfo, GeoLookupError> {
        // Self-lookups depend on who is calling, so they are never cached
        let Some(addr) = ip else {
            return self.fetch(None).await;
        };

        if let Some(cached) = self.cache.get(&addr).await {
            return Ok(cached);
        }

        let info = self.fetch(Some(addr)).await?;
        self.cache.insert(addr, info.clone()).await;
        Ok(info)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_template_substitution() {
        let lookup = HttpGeoLookup::new("https://ipapi.co/{ip}/json/");
        assert_eq!(
            lookup.url_for(Some("203.0.113.5".parse().unwrap())),
            "https://ipapi.co/203.0.113.5/json/"
        );
        assert_eq!(lookup.url_for(None), "https://ipapi.co/json/");

        let lookup = HttpGeoLookup::new("http://ip-api.com/json/{ip}");
        assert_eq!(lookup.url_for(None), "http://ip-api.com/json/");
    }

    #[test]
    fn test_parse_ipapi_style_body() {
        let info = parse_geo_response(&json!({
            "country_name": "Germany",
            "city": "Berlin",
            "latitude": 52.52,
            "longitude": 13.405
        }))
        .unwrap();
        assert_eq!(info.country.as_deref(), Some("Germany"));
        assert_eq!(info.city.as_deref(), Some("Berlin"));
        assert_eq!(info.latitude, Some(52.52));
    }

    #[test]
    fn test_parse_ip_api_style_body() {
        let info = parse_geo_response(&json!({
            "status": "success",
            "country": "Japan",
            "city": "Osaka",
            "lat": 34.69,
            "lon": 135.5
        }))
        .unwrap();
        assert_eq!(info.country.as_deref(), Some("Japan"));
        assert_eq!(info.longitude, Some(135.5));
    }

    #[test]
    fn test_parse_error_bodies() {
        assert!(matches!(
            parse_geo_response(&json!({"error": true, "reason": "Reserved IP Address"})),
            Err(GeoLookupError::Rejected(reason)) if reason == "Reserved IP Address"
        ));
        assert!(matches!(
            parse_geo_response(&json!({"status": "fail", "message": "private range"})),
            Err(GeoLookupError::Rejected(_))
        ));
    }
}
