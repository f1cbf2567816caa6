//! Redis-backed renewal token store.
//!
//! One string key per principal (`user:token:{id}`) set with `PSETEX`, so the
//! server expires it and a new save replaces the old token atomically.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::instrument;

use prodigo_auth::{RenewalTokenStore, StoreError};
use prodigo_core::PrincipalId;

use super::renewal_key;

#[derive(Clone)]
pub struct RedisRenewalStore {
    conn: ConnectionManager,
}

impl RedisRenewalStore {
    /// Connect to `redis_url` (e.g. `redis://localhost:6379`).
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(map_redis_error)?;
        let conn = ConnectionManager::new(client).await.map_err(map_redis_error)?;
        Ok(Self { conn })
    }
}

fn map_redis_error(err: redis::RedisError) -> StoreError {
    StoreError::unavailable(format!("redis error: {err}"))
}

#[async_trait]
impl RenewalTokenStore for RedisRenewalStore {
    #[instrument(skip(self, token), err)]
    async fn save(&self, principal_id: PrincipalId, token: &str, ttl: Duration) -> Result<(), StoreError> {
        // PSETEX rejects 0; round sub-millisecond TTLs up.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn.clone();
        redis::cmd("PSETEX")
            .arg(renewal_key(principal_id))
            .arg(millis)
            .arg(token)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(map_redis_error)
    }

    #[instrument(skip(self), err)]
    async fn get(&self, principal_id: PrincipalId) -> Result<String, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(renewal_key(principal_id))
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(map_redis_error)?
            .ok_or(StoreError::NotFound)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_redis_error)
    }
}

impl core::fmt::Debug for RedisRenewalStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisRenewalStore").finish_non_exhaustive()
    }
}
