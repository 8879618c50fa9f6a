//! Postgres-backed repository implementations.

mod faqs;
mod grants;
mod interviews;
mod news;
mod ordering;
mod organizations;
mod slugs;
mod stats;
mod taxonomy;
mod util;

pub use util::map_sqlx_error;

use std::{fmt, str::FromStr, sync::Arc};

use sqlx::{
    Postgres, Transaction,
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    query,
};
use async_trait::async_trait;
use tracing::info;

use crate::application::repos::{HealthRepo, RepoError};

/// Credential flavor a pool was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRole {
    /// Anonymous reads for the public site; every transaction is read-only.
    Public,
    /// Admin handlers behind the session guard.
    Session,
    /// Migrations and maintenance.
    Service,
}

impl ClientRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientRole::Public => "public",
            ClientRole::Session => "session",
            ClientRole::Service => "service",
        }
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        role: ClientRole,
    ) -> Result<PgPool, sqlx::Error> {
        let mut options = PgConnectOptions::from_str(url)?;
        if role == ClientRole::Public {
            options = options.options([("default_transaction_read_only", "on")]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        info!(
            target = "tsunagu::infra::db",
            role = %role,
            max_connections,
            "database pool ready"
        );
        Ok(pool)
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
