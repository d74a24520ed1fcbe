use crate::{Clock, Error, SystemClock, Token, TokenKind, TokenRepository, error::TokenError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Read-only validation of presented token values. Never deletes anything.
pub struct TokenVerifier<T: TokenRepository> {
    repository: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<T: TokenRepository> TokenVerifier<T> {
    pub fn new(repository: Arc<T>) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Look up `value` among tokens of `kind`.
    ///
    /// Returns [`TokenError::NotFound`] for values that were never issued as well as for
    /// consumed or superseded ones, and [`TokenError::Expired`] once `now >= expires_at`.
    /// Expired tokens stay in the store until consumed or cleaned up.
    pub async fn verify(&self, kind: TokenKind, value: &str) -> Result<Token, Error> {
        let token = self
            .repository
            .find_by_value(kind, value)
            .await?
            .ok_or_else(|| {
                debug!(kind = %kind, "No token for presented value");
                TokenError::NotFound
            })?;

        if token.is_expired_at(self.clock.now()) {
            warn!(kind = %kind, token_id = %token.id, "Presented token has expired");
            return Err(TokenError::Expired.into());
        }

        Ok(token)
    }

    /// `true` if `value` would currently pass [`TokenVerifier::verify`].
    pub async fn check(&self, kind: TokenKind, value: &str) -> Result<bool, Error> {
        match self.verify(kind, value).await {
            Ok(_) => Ok(true),
            Err(Error::Token(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, NewToken, repositories::InMemoryTokenRepository};
    use chrono::{DateTime, Duration};

    async fn setup() -> (
        TokenVerifier<InMemoryTokenRepository>,
        Arc<InMemoryTokenRepository>,
        Arc<ManualClock>,
    ) {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let repository = Arc::new(InMemoryTokenRepository::new());
        repository
            .create(NewToken::new(
                TokenKind::PasswordReset,
                "a@example.com",
                "reset-value".to_string(),
                start + Duration::hours(1),
                start,
            ))
            .await
            .unwrap();

        let verifier = TokenVerifier::new(repository.clone()).with_clock(clock.clone());
        (verifier, repository, clock)
    }

    #[tokio::test]
    async fn test_verify_returns_bound_email_without_deleting() {
        let (verifier, repository, _) = setup().await;

        let token = verifier
            .verify(TokenKind::PasswordReset, "reset-value")
            .await
            .unwrap();
        assert_eq!(token.email, "a@example.com");

        // A second verify still finds it.
        verifier
            .verify(TokenKind::PasswordReset, "reset-value")
            .await
            .unwrap();
        assert_eq!(repository.count(TokenKind::PasswordReset).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_value_and_wrong_kind_are_not_found() {
        let (verifier, _, _) = setup().await;

        assert!(matches!(
            verifier.verify(TokenKind::PasswordReset, "nope").await,
            Err(Error::Token(TokenError::NotFound))
        ));
        assert!(matches!(
            verifier
                .verify(TokenKind::EmailVerification, "reset-value")
                .await,
            Err(Error::Token(TokenError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_but_kept() {
        let (verifier, repository, clock) = setup().await;

        clock.advance(Duration::hours(1));
        assert!(matches!(
            verifier.verify(TokenKind::PasswordReset, "reset-value").await,
            Err(Error::Token(TokenError::Expired))
        ));
        assert_eq!(repository.count(TokenKind::PasswordReset).await, 1);
    }

    #[tokio::test]
    async fn test_check() {
        let (verifier, _, clock) = setup().await;

        assert!(verifier.check(TokenKind::PasswordReset, "reset-value").await.unwrap());
        assert!(!verifier.check(TokenKind::PasswordReset, "other").await.unwrap());

        clock.advance(Duration::minutes(61));
        assert!(!verifier.check(TokenKind::PasswordReset, "reset-value").await.unwrap());
    }
}
