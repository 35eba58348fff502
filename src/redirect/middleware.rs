use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

/// When the request entered the router; feeds the timing header
#[derive(Copy, Clone)]
pub struct RequestStart(pub Instant);

pub async fn record_request_start(mut request: Request<Body>, next: Next) -> Response {
    // Keep an earlier start if an outer layer already set one
    if request.extensions().get::<RequestStart>().is_none() {
        request
            .extensions_mut()
            .insert(RequestStart(Instant::now()));
    }
    next.run(request).await
}
