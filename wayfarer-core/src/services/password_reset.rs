use crate::{
    Argon2Hasher, Clock, CredentialHasher, Error, Identity, IdentityRepository,
    NotificationChannel, RecoveryConfig, TokenKind, TokenRepository,
    services::{RecoveryRequest, recovery::RecoveryFlow},
    validation::validate_password,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Service for password reset operations
pub struct PasswordResetService<I: IdentityRepository, T: TokenRepository> {
    flow: RecoveryFlow<I, T>,
    hasher: Arc<dyn CredentialHasher>,
}

impl<I: IdentityRepository, T: TokenRepository> PasswordResetService<I, T> {
    /// Create a new PasswordResetService. Passwords are hashed with [`Argon2Hasher`] unless
    /// another hasher is set with [`PasswordResetService::with_hasher`].
    pub fn new(
        identities: Arc<I>,
        tokens: Arc<T>,
        notifier: Arc<dyn NotificationChannel>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            flow: RecoveryFlow::new(TokenKind::PasswordReset, identities, tokens, notifier, config),
            hasher: Arc::new(Argon2Hasher),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.flow = self.flow.with_clock(clock);
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Request a password reset for the given email address
    ///
    /// Any earlier reset token for the email stops working. Whether an unknown email is
    /// reported depends on [`RecoveryConfig::enumeration`].
    #[instrument(skip(self), err)]
    pub async fn begin_reset(&self, email: &str) -> Result<RecoveryRequest, Error> {
        self.flow.begin(email).await
    }

    /// Complete the password reset process
    ///
    /// The new password is checked against the password policy before the token is looked
    /// at, so a rejected password leaves the link usable. On success the token is gone and
    /// a "password changed" notice is sent on a best-effort basis.
    #[instrument(skip_all, err)]
    pub async fn complete_reset(&self, value: &str, new_password: &str) -> Result<Identity, Error> {
        validate_password(new_password)?;

        let identities = self.flow.identities();
        let hasher = &self.hasher;

        let identity = self
            .flow
            .complete(value, |identity| async move {
                let hash = hasher.hash(new_password).await?;
                identities.update_password_hash(&identity.id, &hash).await?;
                info!(identity_id = %identity.id, "Password reset");
                Ok(identity)
            })
            .await?;

        if let Err(e) = self.flow.notifier().send_password_changed(&identity.email).await {
            warn!(identity_id = %identity.id, error = %e, "Password changed notice not delivered");
        }

        Ok(identity)
    }

    /// Whether `value` is a live reset token. Nothing is consumed.
    pub async fn check_reset_link(&self, value: &str) -> Result<bool, Error> {
        self.flow.check(value).await
    }
}
