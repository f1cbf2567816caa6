use async_trait::async_trait;
use thiserror::Error;

/// The decision engine itself failed (as opposed to denying).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("policy decision failed: {0}")]
pub struct PolicyError(pub String);

/// Evaluates `(subject, object, action)` against authorization rules.
///
/// In this system the subject is a role, the object a request path and the
/// action a request method.
#[async_trait]
pub trait PolicyDecisionPoint: Send + Sync {
    async fn decide(&self, subject: &str, object: &str, action: &str) -> Result<bool, PolicyError>;
}
