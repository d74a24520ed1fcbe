use crate::{Email, Mailer, MailerError};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::debug;

type Relay = AsyncSmtpTransport<Tokio1Executor>;

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// Plain text connection. Only for local relays such as mailpit.
    None,
    #[default]
    StartTls,
    Tls,
}

/// Connection settings for an SMTP relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpRelay {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: TlsMode,
}

impl SmtpRelay {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: None,
            tls: TlsMode::default(),
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(user), Some(secret)) => Some(Credentials::new(user.clone(), secret.clone())),
            _ => None,
        }
    }
}

/// Sends messages through an SMTP relay. The connection pool is lazy; nothing is
/// dialed until the first message goes out.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    relay: Relay,
}

impl SmtpTransport {
    pub fn connect(settings: &SmtpRelay) -> Result<Self, MailerError> {
        let host = settings.host.as_str();
        let mut relay = match settings.tls {
            TlsMode::None => Relay::builder_dangerous(host),
            TlsMode::StartTls => Relay::starttls_relay(host)?,
            TlsMode::Tls => Relay::relay(host)?,
        };

        if let Some(port) = settings.port {
            relay = relay.port(port);
        }
        if let Some(credentials) = settings.credentials() {
            relay = relay.credentials(credentials);
        }

        debug!(host, tls = ?settings.tls, "SMTP relay configured");
        Ok(Self {
            relay: relay.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let response = self.relay.send(Message::try_from(email)?).await?;
        debug!(code = %response.code(), "Relay accepted message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_with_credentials() {
        let settings = SmtpRelay {
            port: Some(587),
            username: Some("mailer".to_string()),
            password: Some("secret".to_string()),
            ..SmtpRelay::new("smtp.example.com")
        };

        assert!(settings.credentials().is_some());
        assert!(SmtpTransport::connect(&settings).is_ok());
    }

    #[test]
    fn test_username_alone_sends_no_credentials() {
        let settings = SmtpRelay {
            username: Some("mailer".to_string()),
            ..SmtpRelay::new("smtp.example.com")
        };
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_plain_connection_for_local_relay() {
        let settings = SmtpRelay {
            port: Some(1025),
            tls: TlsMode::None,
            ..SmtpRelay::new("localhost")
        };
        assert!(SmtpTransport::connect(&settings).is_ok());
    }
}
