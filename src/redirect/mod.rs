//! HTTP surface of the redirect server

pub mod handlers;
pub mod middleware;
pub mod navigator;
pub mod routes;

pub use navigator::{HttpNavigator, TIMING_HEADER};
pub use routes::create_redirect_router;
