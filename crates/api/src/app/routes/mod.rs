use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/api/v1/health", get(system::health))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
}

/// Endpoints behind the access gate. Paths are kept absolute so the gate
/// hands the full request path to the policy engine.
pub fn protected_router() -> Router {
    Router::new().route("/api/v1/whoami", get(system::whoami))
}
