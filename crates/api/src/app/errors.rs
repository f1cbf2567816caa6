use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use prodigo_auth::{AuthError, GateOutcome, GateRejection};

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    if err.is_domain() {
        tracing::debug!(error = %err, "request rejected");
    }
    match err {
        AuthError::BadInput(e) => json_error(StatusCode::BAD_REQUEST, "bad_request", e.to_string()),
        AuthError::AlreadyExists => json_error(StatusCode::CONFLICT, "already_exists", "user already exists"),
        AuthError::UserNotFound => json_error(StatusCode::NOT_FOUND, "user_not_found", "user not found"),
        AuthError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid credentials")
        }
        AuthError::TokenNotFound => json_error(StatusCode::NOT_FOUND, "token_not_found", "token not found"),
        AuthError::InvalidToken => json_error(StatusCode::UNAUTHORIZED, "invalid_token", "invalid token"),
        AuthError::ExpiredToken => json_error(StatusCode::UNAUTHORIZED, "expired_token", "expired token"),
        AuthError::Internal(e) => {
            tracing::error!(error = %format!("{e:#}"), "request failed");
            internal_error()
        }
    }
}

/// Clients only learn the outcome class; the reason stays in the logs.
pub fn gate_rejection_to_response(rejection: &GateRejection) -> axum::response::Response {
    match rejection.outcome() {
        GateOutcome::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required")
        }
        GateOutcome::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "access denied"),
        GateOutcome::Internal => internal_error(),
    }
}

pub fn internal_error() -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
