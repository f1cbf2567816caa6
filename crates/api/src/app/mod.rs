//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: token codec, stores and policy engine
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::time::Duration;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices, request_timeout: Duration) -> Router {
    // Protected routes: every request passes the access gate.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        services.gate.clone(),
        middleware::access_gate,
    ));

    routes::public_router()
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    request_timeout,
                    middleware::request_deadline,
                ))
                .layer(Extension(services.credentials)),
        )
}
