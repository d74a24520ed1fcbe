//! Builder pattern for constructing Wayfarer instances
//!
//! Storage has to be chosen before anything else can be configured; [`WayfarerBuilder`]
//! tracks that in its type parameter so a builder without storage has no `build` method.
//!
//! # Example
//!
//! ```rust,no_run
//! use wayfarer::{MailerConfig, RecoveryConfig, WayfarerBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wayfarer = WayfarerBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .with_recovery_config(RecoveryConfig::from_env())
//!         .with_mailer_config(MailerConfig::default())
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     wayfarer.cleanup_expired_tokens().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use wayfarer_core::{
    Argon2Hasher, Clock, CredentialHasher, NotificationChannel, RecoveryConfig,
    RepositoryProvider, SystemClock,
};

use crate::Wayfarer;

#[cfg(feature = "mailer")]
use crate::{MailerConfig, MailerNotificationChannel};

/// Errors that can occur when building a Wayfarer instance.
#[derive(Debug, thiserror::Error)]
pub enum WayfarerBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Failed to configure mailer
    #[cfg(feature = "mailer")]
    #[error("Mailer configuration failed: {0}")]
    MailerConfiguration(String),
}

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

/// A type-safe builder for constructing [`Wayfarer`] instances.
///
/// # Defaults
///
/// - Recovery policy: [`RecoveryConfig::default`] (24h verification links, 1h reset links,
///   unknown emails concealed)
/// - Password hashing: Argon2
/// - Clock: system time
/// - Apply migrations: false
///
/// A notification channel is required: either [`with_notifier`](Self::with_notifier) or,
/// with the `mailer` feature, [`with_mailer_config`](Self::with_mailer_config). When both are
/// given the explicit notifier is used.
pub struct WayfarerBuilder<Storage> {
    storage: Storage,
    recovery_config: RecoveryConfig,
    notifier: Option<Arc<dyn NotificationChannel>>,
    hasher: Option<Arc<dyn CredentialHasher>>,
    clock: Option<Arc<dyn Clock>>,
    apply_migrations: bool,
    #[cfg(feature = "mailer")]
    mailer_config: Option<MailerConfig>,
}

impl Default for WayfarerBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl WayfarerBuilder<NoStorage> {
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            recovery_config: RecoveryConfig::default(),
            notifier: None,
            hasher: None,
            clock: None,
            apply_migrations: false,
            #[cfg(feature = "mailer")]
            mailer_config: None,
        }
    }

    /// Use an already constructed repository provider, such as
    /// [`InMemoryRepositoryProvider`](crate::InMemoryRepositoryProvider).
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> WayfarerBuilder<WithStorage<R>> {
        WayfarerBuilder {
            storage: WithStorage { repositories },
            recovery_config: self.recovery_config,
            notifier: self.notifier,
            hasher: self.hasher,
            clock: self.clock,
            apply_migrations: self.apply_migrations,
            #[cfg(feature = "mailer")]
            mailer_config: self.mailer_config,
        }
    }
}

#[cfg(feature = "sqlite")]
impl WayfarerBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://path/to/db.sqlite")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<WayfarerBuilder<WithStorage<crate::SqliteRepositoryProvider>>, WayfarerBuilderError>
    {
        let repositories = crate::SqliteRepositoryProvider::connect(url)
            .await
            .map_err(|e| WayfarerBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(repositories)))
    }
}

impl<R: RepositoryProvider> WayfarerBuilder<WithStorage<R>> {
    pub fn with_recovery_config(mut self, config: RecoveryConfig) -> Self {
        self.recovery_config = config;
        self
    }

    /// Deliver tokens through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationChannel>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the Argon2 password hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Replace the system clock, e.g. with a [`ManualClock`](crate::ManualClock) in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set whether to automatically apply database migrations during build.
    ///
    /// Default: false
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Deliver tokens by email using `config`.
    #[cfg(feature = "mailer")]
    pub fn with_mailer_config(mut self, config: MailerConfig) -> Self {
        self.mailer_config = Some(config);
        self
    }

    /// Configure the mailer from `WAYFARER_MAILER_*` environment variables.
    ///
    /// See [`MailerConfig::from_env`] for the variables read.
    #[cfg(feature = "mailer")]
    pub fn with_mailer_from_env(mut self) -> Result<Self, WayfarerBuilderError> {
        let config = MailerConfig::from_env()
            .map_err(|e| WayfarerBuilderError::MailerConfiguration(e.to_string()))?;
        self.mailer_config = Some(config);
        Ok(self)
    }

    /// Build the Wayfarer instance.
    ///
    /// Fails if the recovery policy is unusable, if no notification channel can be
    /// resolved, or if migrations were requested and do not apply.
    pub async fn build(mut self) -> Result<Wayfarer<R>, WayfarerBuilderError> {
        validate_recovery_config(&self.recovery_config)?;

        let notifier = match self.notifier.take() {
            Some(notifier) => notifier,
            None => self.mailer_notifier()?,
        };

        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| WayfarerBuilderError::Migration(e.to_string()))?;
        }

        Ok(Wayfarer::from_parts(
            self.storage.repositories,
            notifier,
            self.recovery_config,
            self.hasher.unwrap_or_else(|| Arc::new(Argon2Hasher)),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        ))
    }

    #[cfg(feature = "mailer")]
    fn mailer_notifier(&self) -> Result<Arc<dyn NotificationChannel>, WayfarerBuilderError> {
        let config = self.mailer_config.clone().ok_or_else(missing_notifier)?;
        let channel = MailerNotificationChannel::new(config, &self.recovery_config)
            .map_err(|e| WayfarerBuilderError::MailerConfiguration(e.to_string()))?;
        Ok(Arc::new(channel))
    }

    #[cfg(not(feature = "mailer"))]
    fn mailer_notifier(&self) -> Result<Arc<dyn NotificationChannel>, WayfarerBuilderError> {
        Err(missing_notifier())
    }
}

fn missing_notifier() -> WayfarerBuilderError {
    WayfarerBuilderError::InvalidConfiguration(
        "a notification channel or mailer configuration is required".to_string(),
    )
}

fn validate_recovery_config(config: &RecoveryConfig) -> Result<(), WayfarerBuilderError> {
    if config.verification_ttl <= chrono::Duration::zero() {
        return Err(WayfarerBuilderError::InvalidConfiguration(
            "verification_ttl must be positive".to_string(),
        ));
    }
    if config.reset_ttl <= chrono::Duration::zero() {
        return Err(WayfarerBuilderError::InvalidConfiguration(
            "reset_ttl must be positive".to_string(),
        ));
    }
    if config.max_issue_attempts == 0 {
        return Err(WayfarerBuilderError::InvalidConfiguration(
            "max_issue_attempts must be at least 1".to_string(),
        ));
    }
    Ok(())
}
