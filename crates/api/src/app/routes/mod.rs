use axum::Router;

pub mod backup;
pub mod inventory;
pub mod system;

/// Router for every endpoint the service exposes.
///
/// `OPTIONS` never reaches these routers; the CORS layer answers it.
pub fn router() -> Router {
    Router::new()
        .merge(system::router())
        .merge(inventory::router())
        .merge(backup::router())
}
