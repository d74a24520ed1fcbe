use crate::{Error, error::CryptoError};
use async_trait::async_trait;

/// Slow, salted one-way function applied to new passwords before they are stored.
#[async_trait]
pub trait CredentialHasher: Send + Sync + 'static {
    async fn hash(&self, plaintext: &str) -> Result<String, Error>;
}

/// Argon2id via `password-auth`, run on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, plaintext: &str) -> Result<String, Error> {
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || password_auth::generate_hash(plaintext))
            .await
            .map_err(|e| Error::Crypto(CryptoError::PasswordHash(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_argon2_hash_is_salted_phc() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("new-password-123").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, hasher.hash("new-password-123").await.unwrap());
        assert!(password_auth::verify_password("new-password-123", &hash).is_ok());
        assert!(password_auth::verify_password("wrong-password", &hash).is_err());
    }
}
