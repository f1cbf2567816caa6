use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use prodigo_auth::CredentialService;

use crate::app::dto::{LoginRequest, LoginResponse, MessageResponse, RefreshRequest, RefreshResponse, RegisterRequest};
use crate::app::errors::{auth_error_to_response, json_error};

pub async fn register(
    Extension(credentials): Extension<Arc<CredentialService>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match credentials.register(&body.username, &body.password).await {
        Ok(_) => (StatusCode::CREATED, Json(MessageResponse::ok())).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

pub async fn login(
    Extension(credentials): Extension<Arc<CredentialService>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match credentials.login(&body.username, &body.password).await {
        Ok(pair) => (
            StatusCode::OK,
            Json(LoginResponse {
                access_token: pair.access_token,
                refresh_token: pair.renewal_token,
            }),
        )
            .into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

pub async fn refresh(
    Extension(credentials): Extension<Arc<CredentialService>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match credentials.renew(&body.refresh_token).await {
        Ok(access_token) => (StatusCode::OK, Json(RefreshResponse { access_token })).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

fn bad_body(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text())
}
