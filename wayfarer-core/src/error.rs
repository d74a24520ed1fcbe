use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Errors reported by the recovery flows to their caller.
///
/// `InvalidOrUsedLink` and `LinkExpired` carry distinct messages so the UI can offer a
/// re-request when expiry is the known cause.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("This link is invalid or has already been used")]
    InvalidOrUsedLink,

    #[error("This link has expired, please request a new one")]
    LinkExpired,

    #[error("No identity is associated with this email address")]
    IdentityMissing,

    #[error("Failed to issue a unique token after {0} attempts")]
    IssuanceFailed(u32),

    #[error("Notification could not be delivered: {0}")]
    NotificationFailed(String),
}

/// Outcome of looking up a presented token value.
///
/// `NotFound` covers both "never issued" and "already consumed".
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token not found")]
    NotFound,

    #[error("Token expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl Error {
    /// Errors on which the caller may simply try the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Storage(StorageError::Database(_))
                | Error::Storage(StorageError::Connection(_))
                | Error::Recovery(RecoveryError::IssuanceFailed(_))
                | Error::Recovery(RecoveryError::NotificationFailed(_))
        )
    }

    /// Errors that end a `complete_*` attempt; the user has to restart with `begin_*`.
    pub fn is_link_error(&self) -> bool {
        matches!(
            self,
            Error::Recovery(RecoveryError::InvalidOrUsedLink)
                | Error::Recovery(RecoveryError::LinkExpired)
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Conflict(_)))
    }
}
