use axum::{http::StatusCode, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AnalyticsConfig;
use crate::resolver::RedirectResolver;

use super::handlers::{health_check, resolve_scan, show_menu, tap_action, RedirectState};
use super::middleware::record_request_start;

pub fn create_redirect_router(
    resolver: RedirectResolver,
    analytics: AnalyticsConfig,
    redirect_status: StatusCode,
) -> Router {
    let state = Arc::new(RedirectState {
        resolver,
        analytics,
        redirect_status,
    });

    // Menu pages are rendered by a separate front end
    let menu_routes = Router::new()
        .route("/menu/{id}", get(show_menu))
        .route("/menu/{id}/actions/{action_id}", get(tap_action))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(health_check))
        .route("/qr/{id}", get(resolve_scan))
        .merge(menu_routes)
        .layer(middleware::from_fn(record_request_start))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
