use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

use prodigo_auth::{AccessGate, GateRejection};

use crate::app::errors::{gate_rejection_to_response, json_error};

/// Run the access gate; on success the `AccessGrant` is available to handlers
/// as a request extension.
pub async fn access_gate(State(gate): State<AccessGate>, mut req: Request, next: Next) -> Response {
    let authorization = match req.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value.to_owned()),
        Some(Err(_)) => {
            tracing::debug!("authorization header is not valid ASCII");
            return gate_rejection_to_response(&GateRejection::MalformedHeader);
        }
    };

    let path = req.uri().path().to_owned();
    let method = req.method().as_str().to_owned();

    match gate.check(authorization.as_deref(), &path, &method).await {
        Ok(grant) => {
            req.extensions_mut().insert(grant);
            next.run(req).await
        }
        Err(rejection) => gate_rejection_to_response(&rejection),
    }
}

/// Bound the whole request. Dropping the inner future cancels any in-flight
/// store call.
pub async fn request_deadline(State(limit): State<Duration>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, timeout_ms = limit.as_millis() as u64, "request deadline exceeded");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "timeout", "request timed out")
        }
    }
}
