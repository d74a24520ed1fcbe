use crate::{from_timestamp, repositories::map_sqlx_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use wayfarer_core::{
    Error, NewToken, Token, TokenId, TokenKind, TokenRepository, crypto::hash_token,
    error::StorageError,
};

#[derive(Debug, sqlx::FromRow)]
struct SqliteCredentialToken {
    id: String,
    kind: String,
    email: String,
    token_hash: String,
    expires_at: i64,
    created_at: i64,
}

impl TryFrom<SqliteCredentialToken> for Token {
    type Error = Error;

    fn try_from(row: SqliteCredentialToken) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<TokenKind>().map_err(|e| {
            tracing::error!(token_id = %row.id, kind = %row.kind, "Unknown token kind in storage");
            StorageError::Database(e.to_string())
        })?;

        Ok(Token {
            id: TokenId::from(row.id),
            kind,
            email: row.email,
            value_hash: row.token_hash,
            expires_at: from_timestamp(row.expires_at)?,
            created_at: from_timestamp(row.created_at)?,
        })
    }
}

const TOKEN_COLUMNS: &str = "id, kind, email, token_hash, expires_at, created_at";

pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn create(&self, token: NewToken) -> Result<Token, Error> {
        let row = sqlx::query_as::<_, SqliteCredentialToken>(&format!(
            r#"
            INSERT INTO credential_tokens (id, kind, email, token_hash, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(token.id.as_str())
        .bind(token.kind.as_str())
        .bind(&token.email)
        .bind(token.value_hash())
        .bind(token.expires_at.timestamp_millis())
        .bind(token.created_at.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create token", e))?;

        row.try_into()
    }

    async fn find_by_value(&self, kind: TokenKind, value: &str) -> Result<Option<Token>, Error> {
        let row = sqlx::query_as::<_, SqliteCredentialToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM credential_tokens WHERE kind = ?1 AND token_hash = ?2"
        ))
        .bind(kind.as_str())
        .bind(hash_token(value))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find token by value", e))?;

        match row {
            Some(row) => {
                let token = Token::try_from(row)?;
                Ok(token.matches(value).then_some(token))
            }
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, kind: TokenKind, email: &str) -> Result<Option<Token>, Error> {
        sqlx::query_as::<_, SqliteCredentialToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM credential_tokens WHERE kind = ?1 AND email = ?2"
        ))
        .bind(kind.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find token by email", e))?
        .map(Token::try_from)
        .transpose()
    }

    async fn delete(&self, kind: TokenKind, id: &TokenId) -> Result<(), Error> {
        sqlx::query("DELETE FROM credential_tokens WHERE kind = ?1 AND id = ?2")
            .bind(kind.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete token", e))?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM credential_tokens WHERE expires_at <= ?1")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete expired tokens", e))?;

        if result.rows_affected() > 0 {
            tracing::debug!(removed = result.rows_affected(), "Removed expired tokens");
        }
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support;
    use chrono::Duration;
    use wayfarer_core::repositories::TokenRepositoryProvider;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn new_token(kind: TokenKind, email: &str, value: &str, expires_at: DateTime<Utc>) -> NewToken {
        NewToken::new(
            kind,
            email,
            value.to_string(),
            expires_at,
            expires_at - Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn test_create_stores_only_the_digest() {
        let provider = test_support::provider().await;
        let repo = provider.token();

        let token = repo
            .create(new_token(
                TokenKind::PasswordReset,
                "ada@example.com",
                "secret-value",
                at(1_700_003_600),
            ))
            .await
            .unwrap();
        assert_eq!(token.expires_at, at(1_700_003_600));

        let stored: String =
            sqlx::query_scalar("SELECT token_hash FROM credential_tokens WHERE id = ?1")
                .bind(token.id.as_str())
                .fetch_one(provider.pool())
                .await
                .unwrap();
        assert_ne!(stored, "secret-value");
        assert_eq!(stored, hash_token("secret-value"));
    }

    #[tokio::test]
    async fn test_sub_second_expiry_survives_storage() {
        let provider = test_support::provider().await;
        let repo = provider.token();
        let expires = DateTime::from_timestamp(1_700_003_600, 900_000_000).unwrap();

        repo.create(new_token(TokenKind::EmailVerification, "ada@example.com", "v", expires))
            .await
            .unwrap();
        let found = repo
            .find_by_value(TokenKind::EmailVerification, "v")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.expires_at, expires);

        // Still live half a second before expiry.
        assert_eq!(
            repo.delete_expired(expires - Duration::milliseconds(500))
                .await
                .unwrap(),
            0
        );
        assert_eq!(repo.delete_expired(expires).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_by_value_is_scoped_to_kind() {
        let provider = test_support::provider().await;
        let repo = provider.token();
        repo.create(new_token(
            TokenKind::EmailVerification,
            "ada@example.com",
            "shared-value",
            at(1_700_003_600),
        ))
        .await
        .unwrap();

        let found = repo
            .find_by_value(TokenKind::EmailVerification, "shared-value")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(found.kind, TokenKind::EmailVerification);

        assert!(
            repo.find_by_value(TokenKind::PasswordReset, "shared-value")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repo.find_by_value(TokenKind::EmailVerification, "other-value")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unique_constraints_conflict() {
        let provider = test_support::provider().await;
        let repo = provider.token();
        let expires = at(1_700_003_600);

        repo.create(new_token(TokenKind::PasswordReset, "ada@example.com", "v1", expires))
            .await
            .unwrap();

        let same_email = repo
            .create(new_token(TokenKind::PasswordReset, "ada@example.com", "v2", expires))
            .await;
        assert!(same_email.unwrap_err().is_conflict());

        let same_value = repo
            .create(new_token(TokenKind::PasswordReset, "bob@example.com", "v1", expires))
            .await;
        assert!(same_value.unwrap_err().is_conflict());

        // The other kind has its own namespace.
        repo.create(new_token(TokenKind::EmailVerification, "ada@example.com", "v1", expires))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_kind_scoped() {
        let provider = test_support::provider().await;
        let repo = provider.token();
        let token = repo
            .create(new_token(
                TokenKind::EmailVerification,
                "ada@example.com",
                "value",
                at(1_700_003_600),
            ))
            .await
            .unwrap();

        repo.delete(TokenKind::PasswordReset, &token.id).await.unwrap();
        assert!(
            repo.find_by_email(TokenKind::EmailVerification, "ada@example.com")
                .await
                .unwrap()
                .is_some()
        );

        repo.delete(TokenKind::EmailVerification, &token.id)
            .await
            .unwrap();
        repo.delete(TokenKind::EmailVerification, &token.id)
            .await
            .unwrap();
        assert!(
            repo.find_by_value(TokenKind::EmailVerification, "value")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_expired_uses_inclusive_boundary() {
        let provider = test_support::provider().await;
        let repo = provider.token();
        let now = at(1_700_000_000);

        repo.create(new_token(TokenKind::PasswordReset, "a@example.com", "a", now))
            .await
            .unwrap();
        repo.create(new_token(
            TokenKind::EmailVerification,
            "b@example.com",
            "b",
            now - Duration::minutes(5),
        ))
        .await
        .unwrap();
        repo.create(new_token(
            TokenKind::PasswordReset,
            "c@example.com",
            "c",
            now + Duration::seconds(1),
        ))
        .await
        .unwrap();

        assert_eq!(repo.delete_expired(now).await.unwrap(), 2);
        assert_eq!(repo.delete_expired(now).await.unwrap(), 0);
        assert!(
            repo.find_by_value(TokenKind::PasswordReset, "c")
                .await
                .unwrap()
                .is_some()
        );
    }
}
