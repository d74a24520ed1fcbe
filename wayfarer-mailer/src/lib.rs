//! Outbound email for wayfarer
//!
//! Renders the verification, password-reset and password-changed messages with askama and
//! delivers them through a [`Mailer`] transport: SMTP for production, a directory of `.eml`
//! files for development and tests.
//!
//! ```rust,no_run
//! use wayfarer_mailer::prelude::*;
//!
//! # async fn send() -> Result<(), MailerError> {
//! let config = MailerConfig::from_env()?;
//! let mailer = config.build_transport()?;
//! let engine = AskamaTemplateEngine::new();
//!
//! let email = VerificationEmail::build(
//!     &engine,
//!     &config.get_from_address(),
//!     "agent@example.com",
//!     &config.verification_link("token-value"),
//!     std::time::Duration::from_secs(24 * 60 * 60),
//!     config.template_context(),
//! )
//! .await?;
//! mailer.send_email(email).await?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod email;
pub mod email_types;
pub mod error;
pub mod mailer;
pub mod templates;
pub mod transports;

pub use config::{MailerConfig, TransportConfig};
pub use email::{Body, Email};
pub use email_types::{PasswordChangedEmail, PasswordResetEmail, VerificationEmail};
pub use error::MailerError;
pub use mailer::Mailer;
pub use templates::{AskamaTemplateEngine, TemplateContext, TemplateData, TemplateEngine};
pub use transports::{FileTransport, SmtpRelay, SmtpTransport, TlsMode};

pub mod prelude {
    pub use crate::{
        AskamaTemplateEngine, Body, Email, FileTransport, Mailer, MailerConfig,
        MailerError, PasswordChangedEmail, PasswordResetEmail, SmtpTransport, TemplateContext,
        TemplateData, TemplateEngine, VerificationEmail,
    };
}
