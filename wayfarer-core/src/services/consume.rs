use crate::{
    Error, Token, TokenKind, TokenRepository,
    crypto::hash_token,
    error::{RecoveryError, TokenError},
    services::TokenVerifier,
};
use dashmap::DashMap;
use std::{future::Future, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, info};

/// Applies a token's effect and then deletes the token.
///
/// Completions presenting the same value are serialized through a per-value lock, and the
/// token is verified again once the lock is held.
pub(crate) struct TokenConsumer<T: TokenRepository> {
    verifier: TokenVerifier<T>,
    repository: Arc<T>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<T: TokenRepository> TokenConsumer<T> {
    pub(crate) fn new(verifier: TokenVerifier<T>, repository: Arc<T>) -> Self {
        Self {
            verifier,
            repository,
            locks: DashMap::new(),
        }
    }

    pub(crate) fn verifier(&self) -> &TokenVerifier<T> {
        &self.verifier
    }

    /// Verify `value`, run `effect` on the token, then delete it.
    ///
    /// If `effect` fails the token is left untouched and the same value can be presented
    /// again. Verifier errors surface as [`RecoveryError::InvalidOrUsedLink`] and
    /// [`RecoveryError::LinkExpired`].
    pub(crate) async fn consume<F, Fut, R>(
        &self,
        kind: TokenKind,
        value: &str,
        effect: F,
    ) -> Result<R, Error>
    where
        F: FnOnce(Token) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        let key = format!("{kind}:{}", hash_token(value));
        let lock = self.locks.entry(key.clone()).or_default().clone();

        let result = {
            let _guard = lock.lock().await;
            self.consume_locked(kind, value, effect).await
        };

        drop(lock);
        self.locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn consume_locked<F, Fut, R>(
        &self,
        kind: TokenKind,
        value: &str,
        effect: F,
    ) -> Result<R, Error>
    where
        F: FnOnce(Token) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        let token = self
            .verifier
            .verify(kind, value)
            .await
            .map_err(|e| match e {
                Error::Token(TokenError::NotFound) => RecoveryError::InvalidOrUsedLink.into(),
                Error::Token(TokenError::Expired) => RecoveryError::LinkExpired.into(),
                other => other,
            })?;
        let token_id = token.id.clone();

        let output = effect(token).await?;

        if let Err(e) = self.repository.delete(kind, &token_id).await {
            error!(token_id = %token_id, error = %e, "Effect applied but token could not be deleted");
            return Err(e);
        }
        info!(kind = %kind, token_id = %token_id, "Consumed token");

        Ok(output)
    }
}
