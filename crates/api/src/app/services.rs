//! Service wiring: token codec, stores and policy engine.

use std::sync::Arc;

use anyhow::Context;

use prodigo_auth::{AccessGate, CredentialService, CredentialStore, PolicyDecisionPoint, RenewalTokenStore, TokenCodec};
use prodigo_infra::{CasbinPolicy, InMemoryCredentialStore, InMemoryRenewalStore, PostgresCredentialStore, RedisRenewalStore};

use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppServices {
    pub credentials: Arc<CredentialService>,
    pub gate: AccessGate,
}

impl AppServices {
    pub fn new(
        codec: Arc<TokenCodec>,
        credential_store: Arc<dyn CredentialStore>,
        renewal_store: Arc<dyn RenewalTokenStore>,
        policy: Arc<dyn PolicyDecisionPoint>,
    ) -> Self {
        Self {
            credentials: Arc::new(CredentialService::new(codec.clone(), credential_store, renewal_store)),
            gate: AccessGate::new(codec, policy),
        }
    }

    /// In-memory stores (dev/test). State is lost on restart.
    pub fn in_memory(codec: Arc<TokenCodec>, policy: Arc<dyn PolicyDecisionPoint>) -> Self {
        Self::new(
            codec,
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryRenewalStore::new()),
            policy,
        )
    }
}

/// Build services from configuration. Fails fast on a weak secret, an
/// unreadable policy or an unreachable store.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let codec = Arc::new(TokenCodec::new(&config.secret_key).context("invalid SECRET_KEY")?);

    let policy = CasbinPolicy::from_files(&config.rbac_model_path, &config.rbac_policy_path)
        .await
        .context("failed to load RBAC policy")?;
    let policy: Arc<dyn PolicyDecisionPoint> = Arc::new(policy);

    let Some((database_url, redis_url)) = config.persistent_stores() else {
        tracing::warn!("DATABASE_URL/REDIS_URL not both set; using in-memory stores");
        return Ok(AppServices::in_memory(codec, policy));
    };

    let credential_store = PostgresCredentialStore::connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    let renewal_store = RedisRenewalStore::connect(redis_url)
        .await
        .context("failed to connect to Redis")?;
    tracing::info!("using persistent stores");

    Ok(AppServices::new(
        codec,
        Arc::new(credential_store),
        Arc::new(renewal_store),
        policy,
    ))
}
