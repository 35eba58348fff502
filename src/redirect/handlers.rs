use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use super::middleware::RequestStart;
use super::navigator::HttpNavigator;
use crate::analytics::extract_client_ip;
use crate::config::AnalyticsConfig;
use crate::models::{Coordinates, ScanContext};
use crate::resolver::{RedirectResolver, ResolveError};

pub struct RedirectState {
    pub resolver: RedirectResolver,
    pub analytics: AnalyticsConfig,
    pub redirect_status: StatusCode,
}

impl RedirectState {
    fn navigator(&self, started: RequestStart) -> HttpNavigator {
        HttpNavigator::new(self.redirect_status, started.0)
    }
}

/// Resolve a scan and perform the outcome
pub async fn resolve_scan(
    State(state): State<Arc<RedirectState>>,
    Path(qr_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Extension(started): Extension<RequestStart>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let context = scan_context(&headers, addr, &query, &state.analytics);

    match state.resolver.resolve(&qr_id, context).await {
        Ok(outcome) => outcome.navigate(&state.navigator(started)),
        Err(err) => internal_error(&qr_id, err),
    }
}

/// Active menu of a multi-action record as JSON
pub async fn show_menu(
    State(state): State<Arc<RedirectState>>,
    Path(qr_id): Path<String>,
    Extension(started): Extension<RequestStart>,
) -> Response {
    match state.resolver.menu(&qr_id).await {
        Ok(outcome) => outcome.navigate(&state.navigator(started)),
        Err(err) => internal_error(&qr_id, err),
    }
}

/// Perform one tap on a menu entry
pub async fn tap_action(
    State(state): State<Arc<RedirectState>>,
    Path((qr_id, action_id)): Path<(String, String)>,
    Extension(started): Extension<RequestStart>,
) -> Response {
    match state.resolver.tap(&qr_id, &action_id).await {
        Ok(outcome) => outcome.navigate(&state.navigator(started)),
        Err(err) => internal_error(&qr_id, err),
    }
}

fn internal_error(qr_id: &str, err: ResolveError) -> Response {
    tracing::error!(qr_id = %qr_id, error = %err, "scan resolution failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

fn scan_context(
    headers: &HeaderMap,
    addr: SocketAddr,
    query: &HashMap<String, String>,
    analytics: &AnalyticsConfig,
) -> ScanContext {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    ScanContext {
        user_agent: header_text(header::USER_AGENT),
        referrer: header_text(header::REFERER),
        location: coarse_location(query),
        client_ip: Some(extract_client_ip(headers, addr.ip(), analytics)),
    }
}

/// `?lat=..&lng=..` supplied by the scanning client; ignored unless both parse as finite numbers
fn coarse_location(query: &HashMap<String, String>) -> Option<Coordinates> {
    let read = |key: &str| {
        query
            .get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };

    Some(Coordinates {
        latitude: read("lat")?,
        longitude: read("lng").or_else(|| read("lon"))?,
    })
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_coarse_location_requires_both_coordinates() {
        assert_eq!(
            coarse_location(&query(&[("lat", "40.7"), ("lng", "-74.0")])),
            Some(Coordinates {
                latitude: 40.7,
                longitude: -74.0
            })
        );
        assert_eq!(coarse_location(&query(&[("lat", "40.7")])), None);
        assert_eq!(coarse_location(&query(&[("lat", "x"), ("lng", "1")])), None);
        assert_eq!(coarse_location(&query(&[("lat", "NaN"), ("lng", "1")])), None);
    }

    #[test]
    fn test_scan_context_reads_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, "Mozilla/5.0 (iPhone)".parse().unwrap());
        headers.insert(header::REFERER, "https://flyer.example".parse().unwrap());
        let addr = SocketAddr::from(([203, 0, 113, 9], 443));

        let ctx = scan_context(&headers, addr, &HashMap::new(), &AnalyticsConfig::default());
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0 (iPhone)"));
        assert_eq!(ctx.referrer.as_deref(), Some("https://flyer.example"));
        assert_eq!(ctx.client_ip, Some(addr.ip()));
        assert!(ctx.location.is_none());
    }
}
