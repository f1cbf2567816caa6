//! `prodigo-auth` — credential and access-control core.
//!
//! This crate is intentionally decoupled from HTTP and storage: stores and the
//! policy engine are capability traits implemented elsewhere.

pub mod claims;
pub mod gate;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod service;
pub mod store;
pub mod token;

pub use claims::TokenClaims;
pub use gate::{AccessGate, AccessGrant, GateOutcome, GateRejection};
pub use policy::{PolicyDecisionPoint, PolicyError};
pub use principal::Principal;
pub use roles::Role;
pub use service::{AuthError, CredentialService, TokenLifetimes, TokenPair};
pub use store::{CredentialStore, RenewalTokenStore, StoreError};
pub use token::{ConfigError, TokenCodec, TokenError};
