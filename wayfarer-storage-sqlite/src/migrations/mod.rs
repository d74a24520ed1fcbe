//! Versioned schema migrations
//!
//! Migrations are plain SQL, applied oldest first and executed unprepared so one step may
//! hold several statements. Each one runs in a transaction together
//! with the row recording it in `_wayfarer_migrations`, so a failed step leaves no partial
//! schema behind and is retried on the next run.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

const LEDGER: &str = "_wayfarer_migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {version} ({name}) failed: {source}")]
    Step {
        version: i64,
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// One schema change and its inverse. `up` and `down` may hold several statements.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

/// Every migration of this crate, oldest first.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_identities",
        up: r#"
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT,
                email_verified_at INTEGER,
                password_hash TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        down: "DROP TABLE IF EXISTS identities",
    },
    // The unique pairs back value uniqueness within a kind and one live token per email.
    Migration {
        version: 2,
        name: "create_credential_tokens",
        up: r#"
            CREATE TABLE IF NOT EXISTS credential_tokens (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL CHECK (kind IN ('email_verification', 'password_reset')),
                email TEXT NOT NULL,
                token_hash TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (kind, token_hash),
                UNIQUE (kind, email)
            )"#,
        down: "DROP TABLE IF EXISTS credential_tokens",
    },
    Migration {
        version: 3,
        name: "index_credential_tokens_expiry",
        up: "CREATE INDEX IF NOT EXISTS credential_tokens_expires_at ON credential_tokens (expires_at)",
        down: "DROP INDEX IF EXISTS credential_tokens_expires_at",
    },
];

/// Applies and rolls back [`MIGRATIONS`] against a pool.
pub struct SqliteMigrator {
    pool: SqlitePool,
}

impl SqliteMigrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_ledger(&self) -> Result<(), MigrationError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {LEDGER} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            )"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Versions already recorded, ascending.
    pub async fn applied(&self) -> Result<Vec<i64>, MigrationError> {
        self.ensure_ledger().await?;
        let sql = format!("SELECT version FROM {LEDGER} ORDER BY version");
        let versions = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(versions)
    }

    /// Apply every migration in `migrations` that is not recorded yet. Returns how many ran.
    pub async fn apply(&self, migrations: &[Migration]) -> Result<usize, MigrationError> {
        let done = self.applied().await?;
        let mut ran = 0;

        for migration in migrations.iter().filter(|m| !done.contains(&m.version)) {
            info!(version = migration.version, name = migration.name, "Applying migration");
            let step = |source: sqlx::Error| MigrationError::Step {
                version: migration.version,
                name: migration.name,
                source,
            };

            let mut tx = self.pool.begin().await?;
            sqlx::Executor::execute(&mut *tx, migration.up)
                .await
                .map_err(step)?;
            sqlx::query(&format!(
                "INSERT INTO {LEDGER} (version, name, applied_at) VALUES (?1, ?2, ?3)"
            ))
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            ran += 1;
        }

        Ok(ran)
    }

    /// Undo every recorded migration in `migrations`, newest first.
    pub async fn rollback(&self, migrations: &[Migration]) -> Result<usize, MigrationError> {
        let done = self.applied().await?;
        let mut undone = 0;

        for migration in migrations.iter().rev().filter(|m| done.contains(&m.version)) {
            info!(version = migration.version, name = migration.name, "Rolling back migration");

            let mut tx = self.pool.begin().await?;
            sqlx::Executor::execute(&mut *tx, migration.down)
                .await
                .map_err(|source| MigrationError::Step {
                    version: migration.version,
                    name: migration.name,
                    source,
                })?;
            sqlx::query(&format!("DELETE FROM {LEDGER} WHERE version = ?1"))
                .bind(migration.version)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            undone += 1;
        }

        Ok(undone)
    }
}
