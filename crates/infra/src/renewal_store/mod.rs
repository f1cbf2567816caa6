//! Renewal token store adapters.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemoryRenewalStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisRenewalStore;

use prodigo_core::PrincipalId;

/// Storage key of a principal's renewal record.
pub fn renewal_key(principal_id: PrincipalId) -> String {
    format!("user:token:{principal_id}")
}
