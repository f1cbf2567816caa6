use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use prodigo_auth::{AccessGrant, CredentialService};

use crate::app::dto::{MessageResponse, WhoAmIResponse};
use crate::app::errors::auth_error_to_response;

/// Pings the credential and renewal stores.
pub async fn health(Extension(credentials): Extension<Arc<CredentialService>>) -> axum::response::Response {
    match credentials.check_health().await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::ok())).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

pub async fn whoami(Extension(grant): Extension<AccessGrant>) -> impl IntoResponse {
    Json(WhoAmIResponse {
        principal_id: grant.principal_id,
        role: grant.role,
    })
}
