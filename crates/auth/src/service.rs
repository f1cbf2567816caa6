//! Credential service: registration, login and access-token renewal.
//!
//! Renewal token lifecycle per principal:
//! absent → issued (login) → superseded (next login) or expired (store TTL).
//! Only `login` writes renewal records; `renew` never rotates them.

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::instrument;

use prodigo_core::{DomainError, Identifier, Password, PrincipalId};

use crate::password::{self, PasswordError};
use crate::store::{CredentialStore, RenewalTokenStore, StoreError};
use crate::token::{TokenCodec, TokenError};
use crate::Role;

/// Lifetime of access tokens.
pub const ACCESS_TOKEN_TTL: Duration = Duration::minutes(15);

/// Lifetime of renewal tokens (and of their store records).
pub const RENEWAL_TOKEN_TTL: Duration = Duration::hours(24);

/// Token lifetimes used by the service. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub renewal: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: ACCESS_TOKEN_TTL,
            renewal: RENEWAL_TOKEN_TTL,
        }
    }
}

/// Access + renewal token pair returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub renewal_token: String,
}

/// Closed set of outcomes of the credential service.
///
/// Everything except `Internal` is an expected outcome of normal operation.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("bad input: {0}")]
    BadInput(#[from] DomainError),

    #[error("user already exists")]
    AlreadyExists,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token not found")]
    TokenNotFound,

    #[error("invalid token")]
    InvalidToken,

    #[error("expired token")]
    ExpiredToken,

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl AuthError {
    fn internal<E>(err: E, context: &'static str) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(anyhow::Error::new(err).context(context))
    }

    /// True for expected outcomes (everything but infrastructure failures).
    pub fn is_domain(&self) -> bool {
        !matches!(self, AuthError::Internal(_))
    }
}

pub struct CredentialService {
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
    renewals: Arc<dyn RenewalTokenStore>,
    lifetimes: TokenLifetimes,
}

impl CredentialService {
    pub fn new(
        codec: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialStore>,
        renewals: Arc<dyn RenewalTokenStore>,
    ) -> Self {
        Self {
            codec,
            credentials,
            renewals,
            lifetimes: TokenLifetimes::default(),
        }
    }

    pub fn with_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    /// Register a new principal with the store's default role.
    #[instrument(skip(self, password))]
    pub async fn register(&self, identifier: &str, password: &str) -> Result<PrincipalId, AuthError> {
        let identifier = Identifier::parse(identifier)?;
        let password = Password::parse(password)?;

        let hash = run_blocking(move || password::hash_password(password.expose()))
            .await?
            .map_err(|e| AuthError::internal(e, "failed to hash password"))?;

        let id = self
            .credentials
            .create(identifier.as_str(), &hash)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => AuthError::AlreadyExists,
                other => AuthError::internal(other, "failed to register user"),
            })?;

        tracing::info!(principal_id = %id, "principal registered");
        Ok(id)
    }

    /// Authenticate and issue a fresh token pair.
    ///
    /// The renewal token is persisted before anything is returned; it replaces
    /// whatever renewal token the principal held before.
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, AuthError> {
        // Format rules are enforced at registration only.
        if identifier.is_empty() || password.is_empty() {
            return Err(DomainError::validation("username and password are required").into());
        }

        let principal = self
            .credentials
            .find_by_identifier(identifier)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::UserNotFound,
                other => AuthError::internal(other, "failed to get by username"),
            })?;

        let stored_hash = principal.password_hash.clone();
        let candidate = password.to_owned();
        let matches = run_blocking(move || password::verify_password(&candidate, &stored_hash))
            .await?
            .map_err(|e: PasswordError| AuthError::internal(e, "failed to verify password"))?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .codec
            .create(principal.id, &principal.role, self.lifetimes.access)
            .map_err(|e| AuthError::internal(e, "failed to create access token"))?;
        let renewal_token = self
            .codec
            .create(principal.id, &principal.role, self.lifetimes.renewal)
            .map_err(|e| AuthError::internal(e, "failed to create refresh token"))?;

        let ttl = self
            .lifetimes
            .renewal
            .to_std()
            .map_err(|e| AuthError::internal(e, "renewal lifetime must be positive"))?;
        self.renewals
            .save(principal.id, &renewal_token, ttl)
            .await
            .map_err(|e| AuthError::internal(e, "failed to save refresh token"))?;

        tracing::info!(principal_id = %principal.id, "login succeeded");
        Ok(TokenPair {
            access_token,
            renewal_token,
        })
    }

    /// Exchange a live renewal token for a fresh access token.
    #[instrument(skip_all)]
    pub async fn renew(&self, renewal_token: &str) -> Result<String, AuthError> {
        if renewal_token.is_empty() {
            return Err(DomainError::validation("refresh_token is required").into());
        }

        let claims = self.codec.verify(renewal_token).map_err(|e| match e {
            TokenError::Expired => AuthError::ExpiredToken,
            other => {
                tracing::debug!(reason = %other, "renewal token rejected");
                AuthError::InvalidToken
            }
        })?;

        let principal_id = claims
            .principal_id()
            .map_err(|e| AuthError::internal(e, "failed to parse user id from token"))?;
        let role = claims
            .role()
            .map(|r| Role::new(r.to_string()))
            .ok_or(AuthError::InvalidToken)?;

        let stored = self.renewals.get(principal_id).await.map_err(|e| match e {
            StoreError::NotFound => AuthError::TokenNotFound,
            other => AuthError::internal(other, "failed to get refresh token"),
        })?;

        // A mismatch means a later login superseded this token.
        if !constant_time_eq(stored.as_bytes(), renewal_token.as_bytes()) {
            return Err(AuthError::InvalidToken);
        }

        self.codec
            .create(principal_id, &role, self.lifetimes.access)
            .map_err(|e| AuthError::internal(e, "failed to create access token"))
    }

    /// Ping both backing stores.
    pub async fn check_health(&self) -> Result<(), AuthError> {
        self.credentials
            .ping()
            .await
            .map_err(|e| AuthError::internal(e, "failed to ping credential store"))?;
        self.renewals
            .ping()
            .await
            .map_err(|e| AuthError::internal(e, "failed to ping token store"))?;
        Ok(())
    }
}

impl core::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialService")
            .field("codec", &self.codec)
            .field("lifetimes", &self.lifetimes)
            .finish_non_exhaustive()
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::internal(e, "blocking task failed"))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}
