//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the inventory service and store selection
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Router,
    http::{Method, header},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{InventoryService, build_services};

/// How long browsers may cache a preflight answer.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Build the full HTTP router (public entrypoint used by `main.rs` and the function adapter).
pub fn build_app(services: Arc<InventoryService>) -> Router {
    routes::router()
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
}

/// Any origin, the fixed method set, and `Content-Type` as the only request header.
///
/// Every `OPTIONS` request is answered here with 200 and an empty body.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}
