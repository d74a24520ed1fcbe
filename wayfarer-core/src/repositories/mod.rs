//! Repository traits for the data access layer
//!
//! Services talk to storage only through these traits, so a backend can be swapped without
//! touching the recovery flows.
//!
//! # Trait Hierarchy
//!
//! - [`TokenRepository`] and [`IdentityRepository`] define the operations for each data domain
//! - [`TokenRepositoryProvider`] and [`IdentityRepositoryProvider`] give access to them
//! - [`RepositoryProvider`] combines both providers with lifecycle methods
//!
//! The adapters in [`adapter`] turn a shared `Arc<RepositoryProvider>` back into individual
//! repositories that services can own.

pub mod adapter;
pub mod identity;
pub mod memory;
pub mod token;

pub use adapter::{IdentityRepositoryAdapter, TokenRepositoryAdapter};
pub use identity::IdentityRepository;
pub use memory::{InMemoryIdentityRepository, InMemoryRepositoryProvider, InMemoryTokenRepository};
pub use token::TokenRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for identity repository access.
pub trait IdentityRepositoryProvider: Send + Sync + 'static {
    type IdentityRepo: IdentityRepository;

    fn identity(&self) -> &Self::IdentityRepo;
}

/// Provider trait for token repository access.
pub trait TokenRepositoryProvider: Send + Sync + 'static {
    type TokenRepo: TokenRepository;

    fn token(&self) -> &Self::TokenRepo;
}

/// Provider trait that storage backends implement to expose every repository.
///
/// # Example
///
/// ```rust,ignore
/// use wayfarer_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl TokenRepositoryProvider for MyStorage {
///     type TokenRepo = MyTokenRepository;
///     fn token(&self) -> &Self::TokenRepo { &self.tokens }
/// }
///
/// // ... IdentityRepositoryProvider ...
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: IdentityRepositoryProvider + TokenRepositoryProvider {
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
