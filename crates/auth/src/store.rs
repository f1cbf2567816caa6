//! Storage capabilities the credential service depends on.
//!
//! Concrete adapters (in-memory, Postgres, Redis) live in `prodigo-infra`;
//! this crate only states what it needs from them.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use prodigo_core::PrincipalId;

use crate::Principal;

/// Store operation error.
///
/// `NotFound` and `AlreadyExists` are expected outcomes that callers map to
/// domain errors; `Unavailable` is an infrastructure failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Persistent principal records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new principal. Identifier uniqueness is enforced by the store.
    async fn create(&self, identifier: &str, password_hash: &str) -> Result<PrincipalId, StoreError>;

    /// Look up a non-deleted principal by identifier.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Key/value store mapping a principal to its single live renewal token.
#[async_trait]
pub trait RenewalTokenStore: Send + Sync {
    /// Store `token` for `principal_id`, replacing any previous one.
    async fn save(&self, principal_id: PrincipalId, token: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch the live token, or `NotFound` if absent or expired.
    async fn get(&self, principal_id: PrincipalId) -> Result<String, StoreError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
