use crate::{Error, TokenKind};
use async_trait::async_trait;

/// Outbound channel that delivers token values to their owner.
///
/// Transport is up to the implementation (email in production, a recorder in tests). A
/// failed delivery never rolls back the issued token.
#[async_trait]
pub trait NotificationChannel: Send + Sync + 'static {
    /// Deliver `token` for `kind` to `email`, typically as a link.
    async fn send(&self, email: &str, kind: TokenKind, token: &str) -> Result<(), Error>;

    /// Tell `email` that its password was just changed through a reset link.
    async fn send_password_changed(&self, _email: &str) -> Result<(), Error> {
        Ok(())
    }
}
