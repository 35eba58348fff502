//! Geo lookup integration tests
//!
//! A local axum server plays the IP-geolocation API so the HTTP provider and the scan logger
//! can be exercised end to end, including non-200 answers and unreachable hosts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use scanroute::analytics::{GeoLookup, GeoLookupError, HttpGeoLookup, ScanLogger};
use scanroute::models::{QrRecord, QrType, ScanContext};
use scanroute::storage::{SqliteStorage, Storage};
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct FakeApi {
    hits: AtomicUsize,
}

async fn lookup_ip(State(api): State<Arc<FakeApi>>, Path(ip): Path<String>) -> impl IntoResponse {
    api.hits.fetch_add(1, Ordering::SeqCst);
    match ip.as_str() {
        "10.0.0.1" => Json(json!({"error": true, "reason": "Reserved IP Address"})).into_response(),
        "192.0.2.99" => (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response(),
        _ => Json(json!({
            "ip": ip,
            "country_name": "Canada",
            "city": "Toronto",
            "latitude": 43.65,
            "longitude": -79.38
        }))
        .into_response(),
    }
}

async fn lookup_self(State(api): State<Arc<FakeApi>>) -> impl IntoResponse {
    api.hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"country_name": "Iceland", "city": "Reykjavik"}))
}

/// Serve the fake API on an ephemeral port; returns the URL template and the hit counter
async fn spawn_fake_api() -> (String, Arc<FakeApi>) {
    let api = Arc::new(FakeApi::default());
    let app = Router::new()
        .route("/{ip}/json/", get(lookup_ip))
        .route("/json/", get(lookup_self))
        .with_state(Arc::clone(&api));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/{{ip}}/json/"), api)
}

fn ip(raw: &str) -> Option<IpAddr> {
    Some(raw.parse().unwrap())
}

#[tokio::test]
async fn test_lookup_by_ip_is_cached() {
    let (template, api) = spawn_fake_api().await;
    let lookup = HttpGeoLookup::new(&template);

    let first = lookup.lookup(ip("203.0.113.7")).await.unwrap();
    assert_eq!(first.country.as_deref(), Some("Canada"));
    assert_eq!(first.city.as_deref(), Some("Toronto"));
    assert_eq!(first.latitude, Some(43.65));

    let second = lookup.lookup(ip("203.0.113.7")).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(api.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_self_lookup_drops_placeholder() {
    let (template, api) = spawn_fake_api().await;
    let lookup = HttpGeoLookup::new(&template);

    let info = lookup.lookup(None).await.unwrap();
    assert_eq!(info.country.as_deref(), Some("Iceland"));

    lookup.lookup(None).await.unwrap();
    assert_eq!(api.hits.load(Ordering::SeqCst), 2, "self-lookups are not cached");
}

#[tokio::test]
async fn test_error_answers_are_failures() {
    let (template, api) = spawn_fake_api().await;
    let lookup = HttpGeoLookup::new(&template);

    assert!(matches!(
        lookup.lookup(ip("10.0.0.1")).await,
        Err(GeoLookupError::Rejected(_))
    ));
    assert!(matches!(
        lookup.lookup(ip("192.0.2.99")).await,
        Err(GeoLookupError::Status(429))
    ));

    // Failures are retried on the next scan
    let _ = lookup.lookup(ip("192.0.2.99")).await;
    assert_eq!(api.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unreachable_api_is_a_request_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let lookup = HttpGeoLookup::new(&format!("http://{addr}/{{ip}}/json/"));
    assert!(matches!(
        lookup.lookup(ip("203.0.113.7")).await,
        Err(GeoLookupError::Request(_))
    ));
}

async fn logged_scan(template: &str, client_ip: &str) -> (Option<String>, Option<String>) {
    let sqlite = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    sqlite.init().await.unwrap();
    let storage: Arc<dyn Storage> = Arc::new(sqlite);
    storage
        .create_qr_record(&QrRecord::new("geo-log", QrType::Static).with_destination("a.example"))
        .await
        .unwrap();

    let logger = ScanLogger::new(Arc::clone(&storage), Arc::new(HttpGeoLookup::new(template)));
    let context = ScanContext {
        user_agent: Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()),
        client_ip: ip(client_ip),
        ..Default::default()
    };
    logger.log("geo-log", context).await.unwrap();

    let logs = storage.list_scan_logs("geo-log", 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].device_type, "desktop");
    (logs[0].country.clone(), logs[0].city.clone())
}

#[tokio::test]
async fn test_scan_logger_records_lookup_result() {
    let (template, _api) = spawn_fake_api().await;
    let (country, city) = logged_scan(&template, "198.51.100.4").await;
    assert_eq!(country.as_deref(), Some("Canada"));
    assert_eq!(city.as_deref(), Some("Toronto"));
}

#[tokio::test]
async fn test_scan_logger_falls_back_to_unknown() {
    let (template, _api) = spawn_fake_api().await;
    let (country, city) = logged_scan(&template, "192.0.2.99").await;
    assert_eq!(country.as_deref(), Some("Unknown"));
    assert_eq!(city.as_deref(), Some("Unknown"));
}
