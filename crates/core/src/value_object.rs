//! Value objects: equality by value, not identity.
//!
//! Credentials accepted at registration are modeled as validated value
//! objects so malformed input is rejected before any store is touched.

use crate::error::{DomainError, DomainResult};

/// Login identifier (username).
///
/// ASCII letters only, 3 to 20 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 20;

    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let len = raw.chars().count();
        if len < Self::MIN_LEN || len > Self::MAX_LEN {
            return Err(DomainError::validation(format!(
                "username must be between {} and {} characters",
                Self::MIN_LEN,
                Self::MAX_LEN
            )));
        }
        if !raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation("username must contain only letters"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Identifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plaintext password as received from the caller.
///
/// ASCII only, at least 8 characters. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LEN: usize = 8;

    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if !raw.is_ascii() {
            return Err(DomainError::validation("password must be ASCII"));
        }
        if raw.len() < Self::MIN_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {} characters",
                Self::MIN_LEN
            )));
        }
        Ok(Self(raw))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Password {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Password(***)")
    }
}
