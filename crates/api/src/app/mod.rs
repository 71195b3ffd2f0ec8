//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repository backend selection
//! - `routes/`: HTTP routes + handlers
//! - `headers.rs`: alert and pagination response headers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use carhub_infra::AppConfig;

use crate::middleware;

pub mod errors;
pub mod headers;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(router(services))
}

/// Router over already-wired services.
pub fn router(services: services::AppServices) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_span_middleware))
                .layer(Extension(Arc::new(services))),
        )
}
