//! Core functionality for wayfarer credential recovery
//!
//! This crate owns the lifecycle of the two single-use tokens that gate account
//! recovery in the catalog admin: email-verification tokens and password-reset tokens.
//!
//! It is organised in layers:
//!
//! - [`Token`] and [`Identity`] are the data model.
//! - [`repositories`] defines the storage seams ([`TokenRepository`], [`IdentityRepository`])
//!   and ships an in-memory implementation.
//! - [`services`] holds the [`TokenIssuer`], the [`TokenVerifier`] and the two recovery flows
//!   ([`EmailVerificationService`], [`PasswordResetService`]).
//!
//! Delivery of tokens, password hashing and the passage of time are injected through
//! [`NotificationChannel`], [`CredentialHasher`] and [`Clock`] so that storage backends and
//! tests can substitute their own implementations.
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod hasher;
pub mod id;
pub mod identity;
pub mod notification;
pub mod repositories;
pub mod services;
pub mod token;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EnumerationPolicy, RecoveryConfig};
pub use error::Error;
pub use hasher::{Argon2Hasher, CredentialHasher};
pub use identity::{Identity, IdentityId, NewIdentity};
pub use notification::NotificationChannel;
pub use repositories::{IdentityRepository, RepositoryProvider, TokenRepository};
pub use services::{
    EmailVerificationService, PasswordResetService, RecoveryRequest, TokenIssuer, TokenVerifier,
};
pub use token::{IssuedToken, NewToken, Token, TokenId, TokenKind};
