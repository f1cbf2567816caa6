//! Access gate: per-request authentication + policy check.
//!
//! Transport-agnostic: callers pass the raw `Authorization` header value, the
//! request path and the request method. Every gate is terminal; nothing here
//! retries.
//!
//! ```text
//! header present? → scheme valid? → token valid? → audience present? → policy allow?
//! ```

use std::sync::Arc;

use thiserror::Error;

use prodigo_core::PrincipalId;

use crate::policy::{PolicyDecisionPoint, PolicyError};
use crate::token::{TokenCodec, TokenError};
use crate::{Role, TokenClaims};

/// The only accepted `Authorization` scheme.
pub const BEARER_SCHEME: &str = "Bearer";

/// Why a request was rejected. For logs only; callers see [`GateOutcome`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateRejection {
    #[error("missing auth header")]
    MissingHeader,

    #[error("invalid auth header")]
    MalformedHeader,

    #[error("invalid auth scheme")]
    UnsupportedScheme,

    #[error("expired token")]
    ExpiredToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    PolicyFailure(#[from] PolicyError),

    #[error("forbidden")]
    Forbidden,
}

/// Coarse classification of a rejection, the only thing exposed to clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Unauthenticated,
    Forbidden,
    Internal,
}

impl GateRejection {
    pub fn outcome(&self) -> GateOutcome {
        match self {
            GateRejection::MissingHeader
            | GateRejection::MalformedHeader
            | GateRejection::UnsupportedScheme
            | GateRejection::ExpiredToken
            | GateRejection::InvalidToken(_) => GateOutcome::Unauthenticated,
            GateRejection::Forbidden => GateOutcome::Forbidden,
            GateRejection::PolicyFailure(_) => GateOutcome::Internal,
        }
    }
}

/// An admitted request: verified claims plus the acting principal and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub principal_id: PrincipalId,
    pub role: Role,
    pub claims: TokenClaims,
}

impl AccessGrant {
    pub fn subject(&self) -> &str {
        self.claims.subject()
    }
}

#[derive(Clone)]
pub struct AccessGate {
    codec: Arc<TokenCodec>,
    policy: Arc<dyn PolicyDecisionPoint>,
}

impl AccessGate {
    pub fn new(codec: Arc<TokenCodec>, policy: Arc<dyn PolicyDecisionPoint>) -> Self {
        Self { codec, policy }
    }

    /// Run every gate in order; the first failing one decides the rejection.
    pub async fn check(
        &self,
        authorization: Option<&str>,
        path: &str,
        method: &str,
    ) -> Result<AccessGrant, GateRejection> {
        let result = self.evaluate(authorization, path, method).await;
        match &result {
            Ok(grant) => {
                tracing::debug!(subject = grant.subject(), role = %grant.role, path, method, "request allowed");
            }
            Err(rejection @ GateRejection::PolicyFailure(_)) => {
                tracing::error!(reason = %rejection, path, method, "policy engine failure");
            }
            Err(rejection) => {
                tracing::debug!(reason = %rejection, path, method, "request rejected");
            }
        }
        result
    }

    async fn evaluate(
        &self,
        authorization: Option<&str>,
        path: &str,
        method: &str,
    ) -> Result<AccessGrant, GateRejection> {
        let header = authorization
            .filter(|h| !h.is_empty())
            .ok_or(GateRejection::MissingHeader)?;

        let (scheme, token) = header.split_once(' ').ok_or(GateRejection::MalformedHeader)?;
        if scheme != BEARER_SCHEME {
            return Err(GateRejection::UnsupportedScheme);
        }

        let claims = self.codec.verify(token).map_err(|e| match e {
            TokenError::Expired => GateRejection::ExpiredToken,
            other => GateRejection::InvalidToken(other.to_string()),
        })?;

        let principal_id = claims
            .principal_id()
            .map_err(|e| GateRejection::InvalidToken(e.to_string()))?;

        // `verify` has already rejected an empty audience.
        let role = claims
            .role()
            .map(|r| Role::new(r.to_string()))
            .ok_or_else(|| GateRejection::InvalidToken("missing audience".to_string()))?;

        if !self.policy.decide(role.as_str(), path, method).await? {
            return Err(GateRejection::Forbidden);
        }

        Ok(AccessGrant {
            principal_id,
            role,
            claims,
        })
    }
}

impl core::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessGate")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration;

    const SECRET: &str = "gate-test-secret-0123456789abcdefgh";

    /// Allows `admin` everywhere and `user` only on GET; counts calls.
    #[derive(Default)]
    struct RolePolicy {
        calls: AtomicUsize,
        broken: bool,
    }

    #[async_trait]
    impl PolicyDecisionPoint for RolePolicy {
        async fn decide(&self, subject: &str, _object: &str, action: &str) -> Result<bool, PolicyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(PolicyError("model not loaded".to_string()));
            }
            Ok(subject == "admin" || (subject == "user" && action == "GET"))
        }
    }

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(SECRET).unwrap())
    }

    fn gate_with(policy: Arc<RolePolicy>) -> AccessGate {
        AccessGate::new(codec(), policy)
    }

    fn bearer(role: &str, ttl: Duration) -> String {
        let token = codec().create(PrincipalId::new(5), &Role::new(role.to_string()), ttl).unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn allowed_request_yields_grant() {
        let gate = gate_with(Arc::new(RolePolicy::default()));
        let header = bearer("user", Duration::minutes(5));

        let grant = gate.check(Some(&header), "/api/v1/products", "GET").await.unwrap();
        assert_eq!(grant.role.as_str(), "user");
        assert_eq!(grant.subject(), "5");
        assert_eq!(grant.principal_id, PrincipalId::new(5));
    }

    #[tokio::test]
    async fn header_problems_are_unauthenticated_without_policy_call() {
        let policy = Arc::new(RolePolicy::default());
        let gate = gate_with(policy.clone());
        let token = codec()
            .create(PrincipalId::new(5), &Role::new("admin"), Duration::minutes(5))
            .unwrap();

        let cases = [
            (None, GateRejection::MissingHeader),
            (Some(String::new()), GateRejection::MissingHeader),
            (Some(format!("Bearer{token}")), GateRejection::MalformedHeader),
            (Some(format!("Basic {token}")), GateRejection::UnsupportedScheme),
            (Some(format!("bearer {token}")), GateRejection::UnsupportedScheme),
        ];

        for (header, expected) in cases {
            let rejection = gate.check(header.as_deref(), "/", "GET").await.unwrap_err();
            assert_eq!(rejection, expected);
            assert_eq!(rejection.outcome(), GateOutcome::Unauthenticated);
        }
        assert_eq!(policy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_and_invalid_tokens_share_the_unauthenticated_outcome() {
        let gate = gate_with(Arc::new(RolePolicy::default()));

        let expired = gate
            .check(Some(&bearer("admin", Duration::minutes(-1))), "/", "GET")
            .await
            .unwrap_err();
        assert_eq!(expired, GateRejection::ExpiredToken);

        let invalid = gate.check(Some("Bearer not.a.token"), "/", "GET").await.unwrap_err();
        assert!(matches!(invalid, GateRejection::InvalidToken(_)));

        assert_eq!(expired.outcome(), invalid.outcome());
    }

    #[tokio::test]
    async fn empty_audience_is_invalid_without_policy_call() {
        let policy = Arc::new(RolePolicy::default());
        let gate = gate_with(policy.clone());
        let now = chrono::Utc::now().timestamp();
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &serde_json::json!({"jti": "t-1", "sub": "5", "aud": [], "iat": now, "exp": now + 300}),
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let rejection = gate.check(Some(&format!("Bearer {token}")), "/", "GET").await.unwrap_err();
        assert!(matches!(rejection, GateRejection::InvalidToken(_)));
        assert_eq!(rejection.outcome(), GateOutcome::Unauthenticated);
        assert_eq!(policy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn explicit_deny_is_forbidden() {
        let gate = gate_with(Arc::new(RolePolicy::default()));
        let rejection = gate
            .check(Some(&bearer("user", Duration::minutes(5))), "/api/v1/products", "DELETE")
            .await
            .unwrap_err();
        assert_eq!(rejection, GateRejection::Forbidden);
        assert_eq!(rejection.outcome(), GateOutcome::Forbidden);
    }

    #[tokio::test]
    async fn engine_failure_is_internal_and_not_retried() {
        let policy = Arc::new(RolePolicy {
            broken: true,
            ..Default::default()
        });
        let gate = gate_with(policy.clone());

        let rejection = gate
            .check(Some(&bearer("admin", Duration::minutes(5))), "/", "GET")
            .await
            .unwrap_err();
        assert!(matches!(rejection, GateRejection::PolicyFailure(_)));
        assert_eq!(rejection.outcome(), GateOutcome::Internal);
        assert_eq!(policy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn policy_receives_role_path_and_method() {
        struct Recorder(std::sync::Mutex<Vec<(String, String, String)>>);

        #[async_trait]
        impl PolicyDecisionPoint for Recorder {
            async fn decide(&self, subject: &str, object: &str, action: &str) -> Result<bool, PolicyError> {
                self.0
                    .lock()
                    .unwrap()
                    .push((subject.to_string(), object.to_string(), action.to_string()));
                Ok(true)
            }
        }

        let recorder = Arc::new(Recorder(std::sync::Mutex::new(Vec::new())));
        let gate = AccessGate::new(codec(), recorder.clone());
        gate.check(Some(&bearer("admin", Duration::minutes(5))), "/api/v1/categories/3", "PUT")
            .await
            .unwrap();

        let calls = recorder.0.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[("admin".to_string(), "/api/v1/categories/3".to_string(), "PUT".to_string())]
        );
    }
}
