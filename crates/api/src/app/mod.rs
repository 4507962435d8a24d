//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend selection and dispatcher wiring
//! - `routes/`: HTTP handlers, one file per resource
//! - `dto.rs`: query-string shapes
//! - `errors.rs`: status mapping and the JSON error body

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::Config;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &Config) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services))
}

/// Router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    let gated = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(services))
            .layer(axum::middleware::from_fn(middleware::call_context_middleware)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(gated)
}

pub use services::AppServices;
