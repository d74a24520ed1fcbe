//! # Wayfarer
//!
//! Email verification and password recovery for the wayfarer catalog admin.
//!
//! Both flows follow the same shape: `begin_*` issues a single-use token for an email address
//! and delivers it as a link, `complete_*` consumes the token and applies the effect (mark the
//! email verified, or replace the password hash). Only one token per email and flow is ever
//! live; requesting a new link cancels the previous one.
//!
//! ## Storage Support
//!
//! - SQLite (feature `sqlite`, on by default)
//! - In memory, through [`InMemoryRepositoryProvider`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use wayfarer::{MailerConfig, WayfarerBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wayfarer = WayfarerBuilder::new()
//!         .with_sqlite("sqlite://wayfarer.db?mode=rwc")
//!         .await?
//!         .with_mailer_config(MailerConfig::from_env()?)
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     wayfarer.begin_reset("agent@example.com").await?;
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use wayfarer_core::{
    EmailVerificationService, PasswordResetService, RepositoryProvider, SystemClock,
    TokenRepository,
    repositories::{IdentityRepositoryAdapter, TokenRepositoryAdapter},
};

mod builder;
#[cfg(feature = "mailer")]
mod notifier;

pub use builder::{NoStorage, WayfarerBuilder, WayfarerBuilderError, WithStorage};

/// Re-export core types from wayfarer_core
pub use wayfarer_core::{
    Argon2Hasher, Clock, CredentialHasher, EnumerationPolicy, Error, Identity, IdentityId,
    IdentityRepository, ManualClock, NewIdentity, NotificationChannel, RecoveryConfig,
    RecoveryRequest, TokenKind,
    error::{RecoveryError, StorageError, TokenError, ValidationError},
    repositories::{
        IdentityRepositoryProvider, InMemoryRepositoryProvider, TokenRepositoryProvider,
    },
};

#[cfg(feature = "sqlite")]
pub use wayfarer_storage_sqlite::SqliteRepositoryProvider;

#[cfg(feature = "mailer")]
pub use notifier::MailerNotificationChannel;

#[cfg(feature = "mailer")]
pub use wayfarer_mailer::{MailerConfig, MailerError, TransportConfig};

type Identities<R> = IdentityRepositoryAdapter<R>;
type Tokens<R> = TokenRepositoryAdapter<R>;

/// Entry point to the email verification and password reset flows.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use wayfarer::{NotificationChannel, SqliteRepositoryProvider, Wayfarer};
///
/// # async fn example(notifier: Arc<dyn NotificationChannel>) -> Result<(), wayfarer::Error> {
/// let repositories = Arc::new(SqliteRepositoryProvider::connect("sqlite::memory:").await?);
/// let wayfarer = Wayfarer::new(repositories, notifier);
/// wayfarer.migrate().await?;
///
/// wayfarer.begin_verification("agent@example.com").await?;
/// # Ok(())
/// # }
/// ```
pub struct Wayfarer<R: RepositoryProvider> {
    repositories: Arc<R>,
    tokens: Arc<Tokens<R>>,
    clock: Arc<dyn Clock>,
    verification_service: Arc<EmailVerificationService<Identities<R>, Tokens<R>>>,
    reset_service: Arc<PasswordResetService<Identities<R>, Tokens<R>>>,
}

impl<R: RepositoryProvider> Wayfarer<R> {
    /// Create a Wayfarer with the default [`RecoveryConfig`], the system clock and Argon2
    /// password hashing.
    pub fn new(repositories: Arc<R>, notifier: Arc<dyn NotificationChannel>) -> Self {
        Self::from_parts(
            repositories,
            notifier,
            RecoveryConfig::default(),
            Arc::new(Argon2Hasher),
            Arc::new(SystemClock),
        )
    }

    pub(crate) fn from_parts(
        repositories: Arc<R>,
        notifier: Arc<dyn NotificationChannel>,
        config: RecoveryConfig,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let identities = Arc::new(IdentityRepositoryAdapter::new(repositories.clone()));
        let tokens = Arc::new(TokenRepositoryAdapter::new(repositories.clone()));

        let verification_service = EmailVerificationService::new(
            identities.clone(),
            tokens.clone(),
            notifier.clone(),
            config.clone(),
        )
        .with_clock(clock.clone());

        let reset_service = PasswordResetService::new(identities, tokens.clone(), notifier, config)
            .with_hasher(hasher)
            .with_clock(clock.clone());

        Self {
            repositories,
            tokens,
            clock,
            verification_service: Arc::new(verification_service),
            reset_service: Arc::new(reset_service),
        }
    }

    /// The repository provider this instance was built on.
    pub fn repositories(&self) -> &Arc<R> {
        &self.repositories
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Send an email verification link to `email`.
    ///
    /// Any verification link sent earlier to the same address stops working.
    pub async fn begin_verification(&self, email: &str) -> Result<RecoveryRequest, Error> {
        self.verification_service.begin_verification(email).await
    }

    /// Consume a verification link and mark its identity's email as verified.
    ///
    /// Fails with [`RecoveryError::InvalidOrUsedLink`] or [`RecoveryError::LinkExpired`].
    pub async fn complete_verification(&self, token: &str) -> Result<Identity, Error> {
        self.verification_service.complete_verification(token).await
    }

    /// Whether a verification link would currently be accepted. Does not consume it.
    pub async fn check_verification_link(&self, token: &str) -> Result<bool, Error> {
        self.verification_service.check_verification_link(token).await
    }

    /// Send a password reset link to `email`.
    pub async fn begin_reset(&self, email: &str) -> Result<RecoveryRequest, Error> {
        self.reset_service.begin_reset(email).await
    }

    /// Consume a reset link and replace the identity's password with `new_password`.
    pub async fn complete_reset(&self, token: &str, new_password: &str) -> Result<Identity, Error> {
        self.reset_service.complete_reset(token, new_password).await
    }

    /// Whether a reset link would currently be accepted, e.g. before showing the reset form.
    pub async fn check_reset_link(&self, token: &str) -> Result<bool, Error> {
        self.reset_service.check_reset_link(token).await
    }

    /// Delete every expired token of both kinds, returning how many were removed.
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, Error> {
        let removed = self.tokens.delete_expired(self.clock.now()).await?;
        tracing::info!(removed, "Cleaned up expired tokens");
        Ok(removed)
    }
}
