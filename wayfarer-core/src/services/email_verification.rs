//! Email verification flow
//!
//! [`EmailVerificationService::begin_verification`] issues and delivers a token;
//! [`EmailVerificationService::complete_verification`] consumes it and stamps the identity's
//! `email_verified_at`.

use crate::{
    Clock, Error, Identity, IdentityRepository, NotificationChannel, RecoveryConfig, TokenKind,
    TokenRepository,
    error::StorageError,
    services::{RecoveryRequest, recovery::RecoveryFlow},
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Service for email verification operations
pub struct EmailVerificationService<I: IdentityRepository, T: TokenRepository> {
    flow: RecoveryFlow<I, T>,
}

impl<I: IdentityRepository, T: TokenRepository> EmailVerificationService<I, T> {
    pub fn new(
        identities: Arc<I>,
        tokens: Arc<T>,
        notifier: Arc<dyn NotificationChannel>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            flow: RecoveryFlow::new(
                TokenKind::EmailVerification,
                identities,
                tokens,
                notifier,
                config,
            ),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.flow = self.flow.with_clock(clock);
        self
    }

    /// Send a verification link to `email`.
    ///
    /// Any earlier verification token for the email stops working. If delivery fails the new
    /// token is still stored; calling this again is the way to resend.
    #[instrument(skip(self), err)]
    pub async fn begin_verification(&self, email: &str) -> Result<RecoveryRequest, Error> {
        self.flow.begin(email).await
    }

    /// Consume a verification token and mark its identity as verified.
    ///
    /// Returns the updated identity. If the identity update fails the token stays valid.
    #[instrument(skip_all, err)]
    pub async fn complete_verification(&self, value: &str) -> Result<Identity, Error> {
        let flow = &self.flow;
        let identities = flow.identities();

        flow.complete(value, |identity| async move {
            identities.mark_verified(&identity.id, flow.now()).await?;
            let identity = identities
                .find_by_id(&identity.id)
                .await?
                .ok_or(StorageError::NotFound)?;
            info!(identity_id = %identity.id, "Email verified");
            Ok(identity)
        })
        .await
    }

    /// Whether `value` is a live verification token. Nothing is consumed.
    pub async fn check_verification_link(&self, value: &str) -> Result<bool, Error> {
        self.flow.check(value).await
    }
}
