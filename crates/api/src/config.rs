use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_RBAC_MODEL_PATH: &str = "config/rbac_model.conf";
const DEFAULT_RBAC_POLICY_PATH: &str = "config/rbac_policy.csv";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// API configuration sourced from environment variables.
#[derive(Clone)]
pub struct ApiConfig {
    pub secret_key: String,
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub rbac_model_path: PathBuf,
    pub rbac_policy_path: PathBuf,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = var("SECRET_KEY").context("SECRET_KEY must be set")?;
        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .with_context(|| "parse BIND_ADDR")?;
        let request_timeout_secs: u64 = match var("REQUEST_TIMEOUT_SECS") {
            Some(value) => value.parse().with_context(|| "parse REQUEST_TIMEOUT_SECS")?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            secret_key,
            bind_addr,
            database_url: var("DATABASE_URL"),
            redis_url: var("REDIS_URL"),
            rbac_model_path: var("RBAC_MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_RBAC_MODEL_PATH.to_string())
                .into(),
            rbac_policy_path: var("RBAC_POLICY_PATH")
                .unwrap_or_else(|| DEFAULT_RBAC_POLICY_PATH.to_string())
                .into(),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Persistent stores are used only when both backends are configured.
    pub fn persistent_stores(&self) -> Option<(&str, &str)> {
        Some((self.database_url.as_deref()?, self.redis_url.as_deref()?))
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("secret_key", &"***")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "***"))
            .field("redis_url", &self.redis_url)
            .field("rbac_model_path", &self.rbac_model_path)
            .field("rbac_policy_path", &self.rbac_policy_path)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
