use crate::{Error, Identity, IdentityId, NewIdentity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Access to the identities owned by the surrounding application
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Create a new identity
    async fn create(&self, identity: NewIdentity) -> Result<Identity, Error>;

    /// Find an identity by ID
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, Error>;

    /// Find an identity by its normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, Error>;

    /// Set the verification timestamp. Fails with `StorageError::NotFound` for an unknown id.
    async fn mark_verified(&self, id: &IdentityId, at: DateTime<Utc>) -> Result<(), Error>;

    /// Replace the stored password hash. Fails with `StorageError::NotFound` for an unknown id.
    async fn update_password_hash(&self, id: &IdentityId, hash: &str) -> Result<(), Error>;

    /// Retrieve the stored password hash
    async fn get_password_hash(&self, id: &IdentityId) -> Result<Option<String>, Error>;
}
