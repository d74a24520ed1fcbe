use crate::{
    Error,
    token::{NewToken, Token, TokenId, TokenKind},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable store for tokens of both kinds.
///
/// Implementations must hold two uniqueness rules, reporting a violation as
/// [`StorageError::Conflict`](crate::error::StorageError::Conflict) from [`create`](Self::create):
///
/// - the value digest is unique within a kind;
/// - at most one token exists per `(kind, email)`.
///
/// No method may serve cached data.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Insert a new token, persisting only the digest of its value.
    async fn create(&self, token: NewToken) -> Result<Token, Error>;

    /// Find the token of `kind` whose value is `value`.
    async fn find_by_value(&self, kind: TokenKind, value: &str) -> Result<Option<Token>, Error>;

    /// Find the live token of `kind` owned by `email`, if any.
    async fn find_by_email(&self, kind: TokenKind, email: &str) -> Result<Option<Token>, Error>;

    /// Delete a token. Deleting an unknown id is not an error.
    async fn delete(&self, kind: TokenKind, id: &TokenId) -> Result<(), Error>;

    /// Delete every token of any kind with `expires_at <= now`, returning how many went.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;
}
