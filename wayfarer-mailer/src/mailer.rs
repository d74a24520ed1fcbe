use crate::{Email, MailerError};
use async_trait::async_trait;

/// A way of getting an [`Email`] to its recipients.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, email: Email) -> Result<(), MailerError>;
}

#[async_trait]
impl<M: Mailer + ?Sized> Mailer for Box<M> {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        (**self).send_email(email).await
    }
}
