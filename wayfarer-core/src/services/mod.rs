//! Token issuance, verification and the two recovery flows built on them
//!
//! [`TokenIssuer`] and [`TokenVerifier`] only talk to a [`TokenRepository`](crate::TokenRepository).
//! [`EmailVerificationService`] and [`PasswordResetService`] add the identity store, the
//! notification channel and (for resets) the credential hasher on top.

pub mod email_verification;
pub mod issuer;
pub mod password_reset;
pub mod verifier;

mod consume;
mod recovery;

pub use email_verification::EmailVerificationService;
pub use issuer::TokenIssuer;
pub use password_reset::PasswordResetService;
pub use verifier::TokenVerifier;

use crate::TokenKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acknowledgement of a `begin_*` call.
///
/// Its shape does not depend on whether an identity exists for `email`, so it can be
/// returned to an unauthenticated caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRequest {
    /// The normalized email the request was made for.
    pub email: String,
    pub kind: TokenKind,
    pub requested_at: DateTime<Utc>,
}
