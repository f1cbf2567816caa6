use serde::{Deserialize, Serialize};

use prodigo_core::{DomainError, PrincipalId};

/// Claims carried by every signed token (access and renewal alike).
///
/// This is the registered-claims subset the system relies on:
/// - `jti`: fresh UUID per token, so two tokens minted in the same second differ
/// - `sub`: principal id as a decimal string
/// - `aud`: single-entry list holding the principal's role
/// - `iat` / `exp`: unix timestamps (seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub jti: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// The acting role (first audience entry), if any.
    pub fn role(&self) -> Option<&str> {
        self.aud.first().map(String::as_str)
    }

    /// Parse the subject back into a principal id.
    pub fn principal_id(&self) -> Result<PrincipalId, DomainError> {
        self.sub.parse()
    }
}
