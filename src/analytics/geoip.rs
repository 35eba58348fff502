//! GeoIP lookup using a local MaxMind GeoLite2/GeoIP2 City database
//!
//! Offline alternative to the HTTP provider. The database is memory-mapped once and shared.

use anyhow::{Context, Result};
use async_trait::async_trait;
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;

use super::geo::{GeoInfo, GeoLookup, GeoLookupError};

#[derive(Clone)]
pub struct MaxMindGeoLookup {
    reader: Arc<Reader<Mmap>>,
}

impl MaxMindGeoLookup {
    /// Open a City (or Country) `.mmdb` file
    pub fn open(path: &str) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(path) }
            .with_context(|| format!("Failed to open GeoIP City database at {}", path))?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn lookup_sync(&self, ip: IpAddr) -> Result<GeoInfo, GeoLookupError> {
        let result = self
            .reader
            .lookup(ip)
            .map_err(|e| GeoLookupError::Other(e.into()))?;

        if let Ok(Some(city)) = result.decode::<geoip2::City>() {
            return Ok(city_info(&city));
        }

        // Country databases carry no city block
        if let Ok(Some(country)) = result.decode::<geoip2::Country>() {
            return Ok(GeoInfo {
                country: country
                    .country
                    .names
                    .english
                    .or(country.country.iso_code)
                    .map(|s| s.to_string()),
                ..Default::default()
            });
        }

        Err(GeoLookupError::NotFound)
    }
}

fn city_info(city: &geoip2::City<'_>) -> GeoInfo {
    GeoInfo {
        country: city
            .country
            .names
            .english
            .or(city.country.iso_code)
            .map(str::to_string),
        city: city.city.names.english.map(str::to_string),
        latitude: city.location.latitude,
        longitude: city.location.longitude,
    }
}

#[async_trait]
impl GeoLookup for MaxMindGeoLookup {
    async fn lookup(&self, ip: Option<IpAddr>) -> Result<GeoInfo, GeoLookupError> {
        let ip = ip.ok_or(GeoLookupError::NotFound)?;
        self.lookup_sync(ip)
    }

    fn name(&self) -> &'static str {
        "maxmind"
    }
}
