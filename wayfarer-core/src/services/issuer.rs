use crate::{
    Clock, Error, IssuedToken, NewToken, SystemClock, TokenKind, TokenRepository,
    crypto::generate_secure_token,
    error::{RecoveryError, StorageError},
};
use chrono::{Duration, SubsecRound};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Produces fresh tokens, replacing any prior token of the same kind for the email.
pub struct TokenIssuer<T: TokenRepository> {
    repository: Arc<T>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    generate_value: fn() -> String,
}

impl<T: TokenRepository> TokenIssuer<T> {
    pub fn new(repository: Arc<T>) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            generate_value: generate_secure_token,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bound on value regeneration after a store conflict. At least one attempt is made.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_value_generator(mut self, generate_value: fn() -> String) -> Self {
        self.generate_value = generate_value;
        self
    }

    /// Issue a token of `kind` for `email`, valid for `ttl`.
    ///
    /// Each attempt deletes whatever token of `kind` is currently held for `email` and then
    /// inserts a new one. A [`StorageError::Conflict`] from the insert, either a value
    /// collision or a concurrent issue for the same email, starts another attempt with a new
    /// value. Once the attempts are used up this fails with [`RecoveryError::IssuanceFailed`].
    ///
    /// The issue time is kept to millisecond precision, the finest any store persists, so
    /// `expires_at` reads back identically from every backend.
    ///
    /// `email` is used as given; callers normalize it first.
    #[instrument(skip(self, ttl), err)]
    pub async fn issue(
        &self,
        kind: TokenKind,
        email: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, Error> {
        let now = self.clock.now().trunc_subsecs(3);
        let expires_at = now + ttl;

        for attempt in 1..=self.max_attempts {
            if let Some(existing) = self.repository.find_by_email(kind, email).await? {
                self.repository.delete(kind, &existing.id).await?;
                info!(token_id = %existing.id, "Superseded previous token");
            }

            let new_token = NewToken::new(kind, email, (self.generate_value)(), expires_at, now);
            let value = new_token.value.clone();

            match self.repository.create(new_token).await {
                Ok(token) => {
                    info!(token_id = %token.id, expires_at = %token.expires_at, "Issued token");
                    return Ok(IssuedToken::new(token, value));
                }
                Err(Error::Storage(StorageError::Conflict(reason))) => {
                    warn!(attempt, %reason, "Token insert conflicted, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(RecoveryError::IssuanceFailed(self.max_attempts).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, repositories::InMemoryTokenRepository};
    use chrono::DateTime;

    fn issuer() -> (TokenIssuer<InMemoryTokenRepository>, Arc<InMemoryTokenRepository>) {
        let repository = Arc::new(InMemoryTokenRepository::new());
        (TokenIssuer::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn test_issue_time_is_kept_to_milliseconds() {
        let start = DateTime::from_timestamp(1_700_000_000, 900_123_456).unwrap();
        let repository = Arc::new(InMemoryTokenRepository::new());
        let issuer =
            TokenIssuer::new(repository.clone()).with_clock(Arc::new(ManualClock::new(start)));

        let issued = issuer
            .issue(TokenKind::PasswordReset, "a@example.com", Duration::hours(1))
            .await
            .unwrap();

        let millis = DateTime::from_timestamp(1_700_000_000, 900_000_000).unwrap();
        assert_eq!(issued.token.created_at, millis);
        assert_eq!(issued.token.expires_at, millis + Duration::hours(1));
    }

    fn fixed_value() -> String {
        "always-the-same-value".to_string()
    }

    #[tokio::test]
    async fn test_issue_sets_expiry_from_clock() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let repository = Arc::new(InMemoryTokenRepository::new());
        let issuer =
            TokenIssuer::new(repository.clone()).with_clock(Arc::new(ManualClock::new(start)));

        let issued = issuer
            .issue(TokenKind::EmailVerification, "a@example.com", Duration::hours(24))
            .await
            .unwrap();

        assert_eq!(issued.token.created_at, start);
        assert_eq!(issued.token.expires_at, start + Duration::hours(24));
        assert_eq!(issued.token.email, "a@example.com");
        assert!(issued.token.matches(issued.value()));
    }

    #[tokio::test]
    async fn test_issue_values_are_unique_and_long() {
        let (issuer, _) = issuer();
        let first = issuer
            .issue(TokenKind::PasswordReset, "a@example.com", Duration::hours(1))
            .await
            .unwrap();
        let second = issuer
            .issue(TokenKind::PasswordReset, "b@example.com", Duration::hours(1))
            .await
            .unwrap();

        assert_ne!(first.value(), second.value());
        assert!(first.value().len() >= 43);
    }

    #[tokio::test]
    async fn test_reissue_supersedes_previous_token() {
        let (issuer, repository) = issuer();

        let first = issuer
            .issue(TokenKind::PasswordReset, "a@example.com", Duration::hours(1))
            .await
            .unwrap();
        let second = issuer
            .issue(TokenKind::PasswordReset, "a@example.com", Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(repository.count(TokenKind::PasswordReset).await, 1);
        assert!(
            repository
                .find_by_value(TokenKind::PasswordReset, first.value())
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repository
                .find_by_value(TokenKind::PasswordReset, second.value())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_kinds_do_not_supersede_each_other() {
        let (issuer, repository) = issuer();

        issuer
            .issue(TokenKind::EmailVerification, "a@example.com", Duration::hours(24))
            .await
            .unwrap();
        issuer
            .issue(TokenKind::PasswordReset, "a@example.com", Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(repository.count(TokenKind::EmailVerification).await, 1);
        assert_eq!(repository.count(TokenKind::PasswordReset).await, 1);
    }

    #[tokio::test]
    async fn test_persistent_collision_fails_after_bounded_attempts() {
        let (issuer, repository) = issuer();
        let issuer = issuer
            .with_value_generator(fixed_value)
            .with_max_attempts(4);

        issuer
            .issue(TokenKind::PasswordReset, "a@example.com", Duration::hours(1))
            .await
            .unwrap();

        let result = issuer
            .issue(TokenKind::PasswordReset, "b@example.com", Duration::hours(1))
            .await;

        assert!(matches!(
            result,
            Err(Error::Recovery(RecoveryError::IssuanceFailed(4)))
        ));
        assert!(
            repository
                .find_by_email(TokenKind::PasswordReset, "b@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_concurrent_issues_leave_one_token() {
        let (issuer, repository) = issuer();
        let issuer = Arc::new(issuer.with_max_attempts(8));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let issuer = issuer.clone();
            handles.push(tokio::spawn(async move {
                issuer
                    .issue(TokenKind::EmailVerification, "a@example.com", Duration::hours(24))
                    .await
            }));
        }
        for handle in handles {
            let _ = handle.await.unwrap();
        }

        assert_eq!(repository.count(TokenKind::EmailVerification).await, 1);
    }
}
