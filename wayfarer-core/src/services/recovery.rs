use crate::{
    Clock, EnumerationPolicy, Error, Identity, IdentityRepository, NotificationChannel,
    RecoveryConfig, SystemClock, Token, TokenKind, TokenRepository,
    error::RecoveryError,
    services::{RecoveryRequest, TokenIssuer, TokenVerifier, consume::TokenConsumer},
    validation::{normalize_email, validate_email},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Steps shared by both recovery flows: request a token for an email, deliver it, and later
/// consume it against the identity it was issued for.
pub(crate) struct RecoveryFlow<I: IdentityRepository, T: TokenRepository> {
    kind: TokenKind,
    identities: Arc<I>,
    tokens: Arc<T>,
    issuer: TokenIssuer<T>,
    consumer: TokenConsumer<T>,
    notifier: Arc<dyn NotificationChannel>,
    clock: Arc<dyn Clock>,
    config: RecoveryConfig,
}

impl<I: IdentityRepository, T: TokenRepository> RecoveryFlow<I, T> {
    pub(crate) fn new(
        kind: TokenKind,
        identities: Arc<I>,
        tokens: Arc<T>,
        notifier: Arc<dyn NotificationChannel>,
        config: RecoveryConfig,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            kind,
            issuer: Self::issuer(&tokens, &clock, &config),
            consumer: Self::consumer(&tokens, &clock),
            identities,
            tokens,
            notifier,
            clock,
            config,
        }
    }

    pub(crate) fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.issuer = Self::issuer(&self.tokens, &clock, &self.config);
        self.consumer = Self::consumer(&self.tokens, &clock);
        self.clock = clock;
        self
    }

    fn issuer(tokens: &Arc<T>, clock: &Arc<dyn Clock>, config: &RecoveryConfig) -> TokenIssuer<T> {
        TokenIssuer::new(tokens.clone())
            .with_clock(clock.clone())
            .with_max_attempts(config.max_issue_attempts)
    }

    fn consumer(tokens: &Arc<T>, clock: &Arc<dyn Clock>) -> TokenConsumer<T> {
        TokenConsumer::new(
            TokenVerifier::new(tokens.clone()).with_clock(clock.clone()),
            tokens.clone(),
        )
    }

    pub(crate) fn identities(&self) -> &Arc<I> {
        &self.identities
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn NotificationChannel> {
        &self.notifier
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Issue and deliver a token for `email`.
    ///
    /// An unknown email is answered according to [`RecoveryConfig::enumeration`]; with
    /// [`EnumerationPolicy::Conceal`] the result is indistinguishable from a known one.
    pub(crate) async fn begin(&self, email: &str) -> Result<RecoveryRequest, Error> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let request = RecoveryRequest {
            email: email.clone(),
            kind: self.kind,
            requested_at: self.clock.now(),
        };

        if self.identities.find_by_email(&email).await?.is_none() {
            return match self.config.enumeration {
                EnumerationPolicy::Conceal => {
                    debug!(kind = %self.kind, "No identity for email, nothing issued");
                    Ok(request)
                }
                EnumerationPolicy::Reveal => Err(RecoveryError::IdentityMissing.into()),
            };
        }

        let ttl = self.config.ttl_for(self.kind);
        let issued = self.issuer.issue(self.kind, &email, ttl).await?;

        if let Err(e) = self.notifier.send(&email, self.kind, issued.value()).await {
            warn!(
                kind = %self.kind,
                token_id = %issued.token.id,
                error = %e,
                "Token issued but delivery failed"
            );
            return Err(match e {
                Error::Recovery(RecoveryError::NotificationFailed(_)) => e,
                other => RecoveryError::NotificationFailed(other.to_string()).into(),
            });
        }

        info!(kind = %self.kind, token_id = %issued.token.id, "Token delivered");
        Ok(request)
    }

    /// Consume `value`, handing `effect` the identity the token was issued for.
    pub(crate) async fn complete<F, Fut, R>(&self, value: &str, effect: F) -> Result<R, Error>
    where
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        self.consumer
            .consume(self.kind, value, |token: Token| async move {
                let identity = self
                    .identities
                    .find_by_email(&token.email)
                    .await?
                    .ok_or(RecoveryError::IdentityMissing)?;
                effect(identity).await
            })
            .await
    }

    pub(crate) async fn check(&self, value: &str) -> Result<bool, Error> {
        self.consumer.verifier().check(self.kind, value).await
    }
}
