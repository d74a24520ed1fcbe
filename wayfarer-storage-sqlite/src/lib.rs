//! SQLite storage backend for wayfarer
//!
//! Implements [`IdentityRepository`](wayfarer_core::IdentityRepository) and
//! [`TokenRepository`](wayfarer_core::TokenRepository) on top of an `sqlx` SQLite pool.
//! Timestamps are stored as unix milliseconds. Token values are stored only as SHA-256 digests,
//! and the `credential_tokens` table carries `UNIQUE(kind, token_hash)` and
//! `UNIQUE(kind, email)`, so a second live token for the same email is rejected by the
//! database itself.
//!
//! ```rust,no_run
//! use wayfarer_core::RepositoryProvider;
//! use wayfarer_storage_sqlite::SqliteRepositoryProvider;
//!
//! # async fn run() -> Result<(), wayfarer_core::Error> {
//! let provider = SqliteRepositoryProvider::connect("sqlite://wayfarer.db?mode=rwc").await?;
//! provider.migrate().await?;
//! # Ok(())
//! # }
//! ```
pub mod migrations;
pub mod repositories;

pub use repositories::{SqliteIdentityRepository, SqliteRepositoryProvider, SqliteTokenRepository};

use chrono::{DateTime, Utc};
use wayfarer_core::{Error, error::StorageError};

/// Convert a stored unix millisecond timestamp back into a `DateTime`.
pub(crate) fn from_timestamp(millis: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Database(format!("timestamp out of range: {millis}")).into())
}
