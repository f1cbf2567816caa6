use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use prodigo_api::app::AppServices;
use prodigo_auth::TokenCodec;
use prodigo_infra::CasbinPolicy;

const SECRET: &str = "black-box-test-secret-0123456789abc";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config");
        let policy = CasbinPolicy::from_files(
            config_dir.join("rbac_model.conf"),
            config_dir.join("rbac_policy.csv"),
        )
        .await
        .expect("failed to load policy");
        let codec = Arc::new(TokenCodec::new(SECRET).unwrap());
        let services = AppServices::in_memory(codec, Arc::new(policy));

        // Build app (same router as prod), but bind to an ephemeral port.
        let app = prodigo_api::app::build_app(services, Duration::from_secs(10));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api/v1", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn whoami(&self, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}/whoami", self.base_url));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn register_and_login(&self, username: &str, password: &str) -> serde_json::Value {
        let res = self
            .post("/auth/register", json!({"username": username, "password": password}))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = self
            .post("/auth/login", json!({"username": username, "password": password}))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: &str, aud: Vec<&str>, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = json!({
        "jti": format!("test-{}", now.timestamp_nanos_opt().unwrap_or_default()),
        "sub": sub,
        "aud": aud,
        "iat": now.timestamp(),
        "exp": (now + ttl).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_reports_ok() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(format!("{}/health", srv.base_url)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "OK");
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post("/auth/register", json!({"username": "alice", "password": "correcthorse"}))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "OK"}));

    let res = srv
        .post("/auth/register", json!({"username": "alice", "password": "correcthorse"}))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    for bad in [
        json!({"username": "al", "password": "correcthorse"}),
        json!({"username": "alice1", "password": "correcthorse"}),
        json!({"username": "bobby", "password": "short"}),
        json!({"username": "bobby"}),
    ] {
        let res = srv.post("/auth/register", bad).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "bad_request");
    }
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(format!("{}/auth/login", srv.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_distinguishes_unknown_user_from_wrong_password() {
    let srv = TestServer::spawn().await;
    let tokens = srv.register_and_login("alice", "correcthorse").await;
    assert!(tokens["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(tokens["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));

    let res = srv
        .post("/auth/login", json!({"username": "alice", "password": "wrongpassword"}))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Registration format rules do not apply to login input.
    let res = srv
        .post("/auth/login", json!({"username": "alice", "password": "wrong"}))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .post("/auth/login", json!({"username": "bob", "password": "correcthorse"}))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .post("/auth/login", json!({"username": "", "password": "correcthorse"}))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_issues_access_token_for_latest_login_only() {
    let srv = TestServer::spawn().await;
    let first = srv.register_and_login("alice", "correcthorse").await;

    let res = srv
        .post("/auth/refresh", json!({"refresh_token": first["refresh_token"]}))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let access = body["access_token"].as_str().unwrap().to_string();
    assert_eq!(srv.whoami(Some(&access)).await.status(), StatusCode::OK);

    let res = srv
        .post("/auth/login", json!({"username": "alice", "password": "correcthorse"}))
        .await;
    let second: serde_json::Value = res.json().await.unwrap();

    let res = srv
        .post("/auth/refresh", json!({"refresh_token": first["refresh_token"]}))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .post("/auth/refresh", json!({"refresh_token": second["refresh_token"]}))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_bad_tokens() {
    let srv = TestServer::spawn().await;

    let res = srv.post("/auth/refresh", json!({"refresh_token": ""})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.post("/auth/refresh", json!({"refresh_token": "garbage"})).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Well-signed, but never issued by a login.
    let unknown = mint_jwt("99", vec!["user"], ChronoDuration::hours(1));
    let res = srv.post("/auth/refresh", json!({"refresh_token": unknown})).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let expired = mint_jwt("99", vec!["user"], ChronoDuration::minutes(-1));
    let res = srv.post("/auth/refresh", json!({"refresh_token": expired})).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "expired_token");
}

#[tokio::test]
async fn whoami_reports_principal_and_role() {
    let srv = TestServer::spawn().await;
    let tokens = srv.register_and_login("alice", "correcthorse").await;

    let res = srv.whoami(tokens["access_token"].as_str()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"principal_id": 1, "role": "user"}));

    let admin = mint_jwt("7", vec!["admin"], ChronoDuration::minutes(5));
    let res = srv.whoami(Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"principal_id": 7, "role": "admin"}));
}

#[tokio::test]
async fn gate_rejects_unauthenticated_and_unauthorized_requests() {
    let srv = TestServer::spawn().await;

    let res = srv.whoami(None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = srv
        .client
        .get(format!("{}/whoami", srv.base_url))
        .header("authorization", "Basic YWxpY2U6cHc=")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let expired = mint_jwt("1", vec!["user"], ChronoDuration::minutes(-1));
    assert_eq!(srv.whoami(Some(&expired)).await.status(), StatusCode::UNAUTHORIZED);

    let no_role = mint_jwt("1", vec![], ChronoDuration::minutes(5));
    assert_eq!(srv.whoami(Some(&no_role)).await.status(), StatusCode::UNAUTHORIZED);

    // Valid token, but no rule grants the role anything.
    let guest = mint_jwt("1", vec!["guest"], ChronoDuration::minutes(5));
    let res = srv.whoami(Some(&guest)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}
