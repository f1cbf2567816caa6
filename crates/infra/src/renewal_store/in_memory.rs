use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use prodigo_auth::{RenewalTokenStore, StoreError};
use prodigo_core::PrincipalId;

/// In-memory renewal token store for tests/dev.
///
/// Expiry is checked on read; stale entries are dropped lazily.
#[derive(Debug, Default)]
pub struct InMemoryRenewalStore {
    entries: RwLock<HashMap<PrincipalId, Entry>>,
}

#[derive(Debug)]
struct Entry {
    token: String,
    /// `None` when the TTL is too large to represent; such entries never expire.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

impl InMemoryRenewalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::unavailable("renewal store lock poisoned")
}

#[async_trait]
impl RenewalTokenStore for InMemoryRenewalStore {
    async fn save(&self, principal_id: PrincipalId, token: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(
            principal_id,
            Entry {
                token: token.to_string(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, principal_id: PrincipalId) -> Result<String, StoreError> {
        {
            let entries = self.entries.read().map_err(poisoned)?;
            match entries.get(&principal_id) {
                None => return Err(StoreError::NotFound),
                Some(entry) if entry.is_live(Instant::now()) => return Ok(entry.token.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries
            .get(&principal_id)
            .is_some_and(|e| !e.is_live(Instant::now()))
        {
            entries.remove(&principal_id);
        }
        Err(StoreError::NotFound)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
