//! Email delivery of recovery links
//!
//! [`MailerNotificationChannel`] turns an issued token into a link built from
//! [`MailerConfig`], renders the matching template and hands the message to a
//! [`Mailer`] transport.

use async_trait::async_trait;
use std::time::Duration;
use wayfarer_core::{
    Error, NotificationChannel, RecoveryConfig, TokenKind, error::RecoveryError,
};
use wayfarer_mailer::{
    AskamaTemplateEngine, Mailer, MailerConfig, MailerError, PasswordChangedEmail,
    PasswordResetEmail, VerificationEmail,
};

pub struct MailerNotificationChannel {
    mailer: Box<dyn Mailer>,
    engine: AskamaTemplateEngine,
    config: MailerConfig,
    verification_ttl: Duration,
    reset_ttl: Duration,
}

impl MailerNotificationChannel {
    /// Build the transport described by `config`.
    ///
    /// The token lifetimes quoted in the emails are taken from `recovery`.
    pub fn new(config: MailerConfig, recovery: &RecoveryConfig) -> Result<Self, MailerError> {
        config.validate()?;
        let mailer = config.build_transport()?;
        Ok(Self::with_mailer(mailer, config, recovery))
    }

    /// Use an existing transport instead of building one from `config.transport`.
    pub fn with_mailer(
        mailer: Box<dyn Mailer>,
        config: MailerConfig,
        recovery: &RecoveryConfig,
    ) -> Self {
        Self {
            mailer,
            engine: AskamaTemplateEngine::new(),
            config,
            verification_ttl: recovery.verification_ttl.to_std().unwrap_or_default(),
            reset_ttl: recovery.reset_ttl.to_std().unwrap_or_default(),
        }
    }
}

fn delivery_error(kind: &'static str, e: MailerError) -> Error {
    tracing::error!(email_kind = kind, error = %e, "Failed to send email");
    RecoveryError::NotificationFailed(e.to_string()).into()
}

#[async_trait]
impl NotificationChannel for MailerNotificationChannel {
    async fn send(&self, email: &str, kind: TokenKind, token: &str) -> Result<(), Error> {
        let from = self.config.get_from_address();
        let context = self.config.template_context();

        let message = match kind {
            TokenKind::EmailVerification => {
                VerificationEmail::build(
                    &self.engine,
                    &from,
                    email,
                    &self.config.verification_link(token),
                    self.verification_ttl,
                    context,
                )
                .await
            }
            TokenKind::PasswordReset => {
                PasswordResetEmail::build(
                    &self.engine,
                    &from,
                    email,
                    &self.config.reset_link(token),
                    self.reset_ttl,
                    context,
                )
                .await
            }
        }
        .map_err(|e| delivery_error(kind.as_str(), e))?;

        self.mailer
            .send_email(message)
            .await
            .map_err(|e| delivery_error(kind.as_str(), e))?;

        tracing::debug!(kind = %kind, "Recovery email sent");
        Ok(())
    }

    async fn send_password_changed(&self, email: &str) -> Result<(), Error> {
        let message = PasswordChangedEmail::build(
            &self.engine,
            &self.config.get_from_address(),
            email,
            self.config.template_context(),
        )
        .await
        .map_err(|e| delivery_error("password_changed", e))?;

        self.mailer
            .send_email(message)
            .await
            .map_err(|e| delivery_error("password_changed", e))
    }
}
