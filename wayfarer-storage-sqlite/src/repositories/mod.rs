//! Repository implementations for SQLite storage

pub mod identity;
pub mod token;

pub use identity::SqliteIdentityRepository;
pub use token::SqliteTokenRepository;

use crate::migrations::{MIGRATIONS, SqliteMigrator};
use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc};
use wayfarer_core::{
    Error,
    error::StorageError,
    repositories::{IdentityRepositoryProvider, RepositoryProvider, TokenRepositoryProvider},
};

/// Map an `sqlx` error to a storage error, logging anything that is not a constraint hit.
pub(crate) fn map_sqlx_error(operation: &'static str, e: sqlx::Error) -> Error {
    if let Some(db_error) = e.as_database_error() {
        if db_error.is_unique_violation() {
            return StorageError::Conflict(db_error.message().to_string()).into();
        }
    }

    tracing::error!(operation, error = %e, "SQLite query failed");
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Connection(e.to_string()).into()
        }
        _ => StorageError::Database(e.to_string()).into(),
    }
}

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    identity: Arc<SqliteIdentityRepository>,
    token: Arc<SqliteTokenRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let identity = Arc::new(SqliteIdentityRepository::new(pool.clone()));
        let token = Arc::new(SqliteTokenRepository::new(pool.clone()));

        Self {
            pool,
            identity,
            token,
        }
    }

    /// Open a pool for `database_url`, creating the database file if it does not exist.
    ///
    /// `sqlite::memory:` is opened with a single connection, since every connection to an
    /// in-memory database sees its own empty database.
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .create_if_missing(true);

        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to open SQLite database");
                StorageError::Connection(e.to_string())
            })?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl IdentityRepositoryProvider for SqliteRepositoryProvider {
    type IdentityRepo = SqliteIdentityRepository;

    fn identity(&self) -> &Self::IdentityRepo {
        &self.identity
    }
}

impl TokenRepositoryProvider for SqliteRepositoryProvider {
    type TokenRepo = SqliteTokenRepository;

    fn token(&self) -> &Self::TokenRepo {
        &self.token
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let ran = SqliteMigrator::new(self.pool.clone())
            .apply(MIGRATIONS)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Schema migration failed");
                Error::Storage(StorageError::Migration(e.to_string()))
            })?;

        tracing::debug!(ran, "Schema up to date");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;
        Ok(())
    }
}
