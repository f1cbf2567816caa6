//! Infrastructure layer: concrete stores and the policy engine adapter.

pub mod credential_store;
pub mod policy;
pub mod renewal_store;

pub use credential_store::{InMemoryCredentialStore, PostgresCredentialStore};
pub use policy::{CasbinPolicy, PolicyRule};
#[cfg(feature = "redis")]
pub use renewal_store::RedisRenewalStore;
pub use renewal_store::InMemoryRenewalStore;
