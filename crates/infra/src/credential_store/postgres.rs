//! Postgres-backed credential store.
//!
//! Expects a `users` table with a unique `username` column; the schema itself
//! is owned by deployment.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `AlreadyExists` | Identifier already registered (deleted rows included) |
//! | Database (other) | Any other | `Unavailable` | Constraint or type errors |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` | Pool exhausted or shut down |
//! | Other | N/A | `Unavailable` | Network errors, connection failures, etc. |
//!
//! A missing row is not an error at the SQL level (`fetch_optional`) and is
//! reported as `NotFound`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use prodigo_auth::{CredentialStore, Principal, Role, StoreError};
use prodigo_core::PrincipalId;

const MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self, password_hash), err)]
    async fn create(&self, identifier: &str, password_hash: &str) -> Result<PrincipalId, StoreError> {
        let row = sqlx::query("INSERT INTO users (username, password) VALUES ($1, $2) RETURNING id")
            .bind(identifier)
            .bind(password_hash)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| map_sqlx_error("create", e))?;

        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("create", e))?;
        Ok(PrincipalId::new(id))
    }

    #[instrument(skip(self), err)]
    async fn find_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password, role, created_at, updated_at, deleted_at
            FROM users
            WHERE username = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(identifier)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("find_by_identifier", e))?
        .ok_or(StoreError::NotFound)?;

        principal_from_row(&row).map_err(|e| map_sqlx_error("find_by_identifier", e))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("ping", e))
    }
}

fn principal_from_row(row: &PgRow) -> Result<Principal, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at")?;
    Ok(Principal {
        id: PrincipalId::new(row.try_get("id")?),
        identifier: row.try_get("username")?,
        password_hash: row.try_get("password")?,
        role: Role::new(role),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at,
    })
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::AlreadyExists;
    }
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::unavailable(format!("connection pool closed in {operation}")),
        other => StoreError::unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
