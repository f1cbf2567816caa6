use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use prodigo_auth::{CredentialStore, Principal, Role, StoreError};
use prodigo_core::PrincipalId;

/// In-memory credential store for tests/dev.
///
/// Ids are assigned sequentially from 1. Identifiers stay reserved after a
/// soft delete, matching a unique constraint on the username column.
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
    default_role: Role,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    principals: HashMap<String, Principal>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::with_default_role(Role::default())
    }

    pub fn with_default_role(role: Role) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            default_role: role,
        }
    }

    /// Change a principal's role (dev seeding; no such operation in the service).
    pub fn assign_role(&self, identifier: &str, role: Role) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let principal = inner.principals.get_mut(identifier).ok_or(StoreError::NotFound)?;
        principal.role = role;
        principal.updated_at = Utc::now();
        Ok(())
    }

    /// Mark a principal deleted; it stops being visible to lookups.
    pub fn soft_delete(&self, identifier: &str) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let principal = inner.principals.get_mut(identifier).ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        principal.deleted_at = Some(now);
        principal.updated_at = now;
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::unavailable("credential store lock poisoned"))
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, identifier: &str, password_hash: &str) -> Result<PrincipalId, StoreError> {
        let mut inner = self.write()?;
        if inner.principals.contains_key(identifier) {
            return Err(StoreError::AlreadyExists);
        }

        inner.last_id += 1;
        let id = PrincipalId::new(inner.last_id);
        let now = Utc::now();
        inner.principals.insert(
            identifier.to_string(),
            Principal {
                id,
                identifier: identifier.to_string(),
                password_hash: password_hash.to_string(),
                role: self.default_role.clone(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
        );
        Ok(id)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("credential store lock poisoned"))?;
        inner
            .principals
            .get(identifier)
            .filter(|p| !p.is_deleted())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
