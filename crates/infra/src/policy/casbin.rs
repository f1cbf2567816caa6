//! Casbin-backed policy decision point.
//!
//! Requests are evaluated as `(role, path, method)`. Paths in policy rules
//! use `keyMatch2` patterns, so `/api/v1/products/:id` and `/api/v1/*` work.

use std::path::Path;

use async_trait::async_trait;
use casbin::{CoreApi, DefaultModel, Enforcer, FileAdapter, MemoryAdapter, MgmtApi};
use tokio::sync::RwLock;

use prodigo_auth::{PolicyDecisionPoint, PolicyError};

/// Embedded model used when rules are supplied in memory.
pub const DEFAULT_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && keyMatch2(r.obj, p.obj) && r.act == p.act
"#;

/// One allow rule: `subject` may perform `action` on `object`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl PolicyRule {
    pub fn new(subject: impl Into<String>, object: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }
}

pub struct CasbinPolicy {
    enforcer: RwLock<Enforcer>,
}

impl CasbinPolicy {
    /// Load a model file and a CSV policy file.
    pub async fn from_files(model_path: impl AsRef<Path>, policy_path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let model_path = model_path.as_ref();
        let policy_path = policy_path.as_ref();

        let model = DefaultModel::from_file(model_path)
            .await
            .map_err(|e| PolicyError(format!("failed to load model {}: {e}", model_path.display())))?;
        let adapter = FileAdapter::new(policy_path.to_path_buf());
        let enforcer = Enforcer::new(model, adapter)
            .await
            .map_err(|e| PolicyError(format!("failed to load policy {}: {e}", policy_path.display())))?;

        tracing::info!(
            model = %model_path.display(),
            policy = %policy_path.display(),
            "policy loaded"
        );
        Ok(Self {
            enforcer: RwLock::new(enforcer),
        })
    }

    /// Build from [`DEFAULT_MODEL`] and in-memory rules.
    pub async fn from_rules(rules: &[PolicyRule]) -> Result<Self, PolicyError> {
        let model = DefaultModel::from_str(DEFAULT_MODEL).await.map_err(map_casbin_error)?;
        let enforcer = Enforcer::new(model, MemoryAdapter::default())
            .await
            .map_err(map_casbin_error)?;

        let policy = Self {
            enforcer: RwLock::new(enforcer),
        };
        for rule in rules {
            policy.add_rule(rule).await?;
        }
        Ok(policy)
    }

    /// Add an allow rule at runtime. Returns `false` if it was already present.
    pub async fn add_rule(&self, rule: &PolicyRule) -> Result<bool, PolicyError> {
        self.enforcer
            .write()
            .await
            .add_policy(vec![rule.subject.clone(), rule.object.clone(), rule.action.clone()])
            .await
            .map_err(map_casbin_error)
    }
}

fn map_casbin_error(err: casbin::Error) -> PolicyError {
    PolicyError(err.to_string())
}

#[async_trait]
impl PolicyDecisionPoint for CasbinPolicy {
    async fn decide(&self, subject: &str, object: &str, action: &str) -> Result<bool, PolicyError> {
        self.enforcer
            .read()
            .await
            .enforce((subject, object, action))
            .map_err(map_casbin_error)
    }
}

impl core::fmt::Debug for CasbinPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CasbinPolicy").finish_non_exhaustive()
    }
}
