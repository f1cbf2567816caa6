//! Token codec: HS256-signed, self-contained tokens.
//!
//! The codec is a pure function of its secret. It is constructed once at
//! startup and shared (`Arc<TokenCodec>`) by the credential service and the
//! access gate.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use prodigo_core::PrincipalId;

use crate::{Role, TokenClaims};

/// Minimum signing secret length, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Deployment-time configuration error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signing secret too short: {actual} bytes (minimum {min})")]
    WeakSecret { min: usize, actual: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec around `secret`.
    ///
    /// Fails fast if the secret is shorter than [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }

        // Only HS256 is accepted; tokens whose header names any other
        // algorithm (or "none") fail before the signature is looked at.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        // The audience carries the role, not a service name; it is checked
        // for presence below instead of against an expected value.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Mint a signed token for `subject` acting as `role`, valid for `ttl`.
    ///
    /// A negative `ttl`, however small, yields a token that is already expired.
    pub fn create(&self, subject: PrincipalId, role: &Role, ttl: Duration) -> Result<String, TokenError> {
        let issued_at = Utc::now();
        let iat = issued_at.timestamp();
        let mut exp = (issued_at + ttl).timestamp();
        // Claims have whole-second precision and `exp == now` still verifies.
        if ttl < Duration::zero() {
            exp = exp.min(iat - 1);
        }

        let claims = TokenClaims {
            jti: Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            aud: vec![role.as_str().to_string()],
            iat,
            exp,
        };

        jsonwebtoken::encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm, expiry and audience; return the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        if data.claims.role().is_none_or(str::is_empty) {
            return Err(TokenError::Invalid("missing audience".to_string()));
        }

        Ok(data.claims)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}
