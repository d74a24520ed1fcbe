use crate::{
    FileTransport, Mailer, MailerError, SmtpRelay, SmtpTransport, TemplateContext, TlsMode,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_VERIFICATION_PATH: &str = "/verify-email";
const DEFAULT_RESET_PATH: &str = "/reset-password";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub transport: TransportConfig,
    pub from_address: String,
    pub from_name: Option<String>,
    pub app_name: String,
    /// Base URL of the admin frontend; links are built as `{app_url}{path}?token=…`.
    pub app_url: String,
    #[serde(default = "default_verification_path")]
    pub verification_path: String,
    #[serde(default = "default_reset_path")]
    pub reset_path: String,
}

fn default_verification_path() -> String {
    DEFAULT_VERIFICATION_PATH.to_string()
}

fn default_reset_path() -> String {
    DEFAULT_RESET_PATH.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Smtp(SmtpRelay),
    File {
        output_dir: PathBuf,
    },
}

impl MailerConfig {
    /// Read the configuration from `WAYFARER_MAILER_*` variables.
    ///
    /// `WAYFARER_MAILER_SMTP_HOST` selects SMTP; otherwise messages are written to
    /// `WAYFARER_MAILER_FILE_OUTPUT_DIR` (default `./emails`).
    pub fn from_env() -> Result<Self, MailerError> {
        let var = |name: &str| std::env::var(format!("WAYFARER_MAILER_{name}")).ok();
        let defaults = Self::default();

        let transport = if let Some(host) = var("SMTP_HOST") {
            let port = match var("SMTP_PORT") {
                Some(port) => Some(port.parse::<u16>().map_err(|e| {
                    MailerError::Config(format!("WAYFARER_MAILER_SMTP_PORT: {e}"))
                })?),
                None => None,
            };
            let tls = match var("SMTP_TLS").map(|t| t.to_lowercase()).as_deref() {
                None | Some("starttls") => TlsMode::StartTls,
                Some("none") => TlsMode::None,
                Some("tls") => TlsMode::Tls,
                Some(other) => {
                    return Err(MailerError::Config(format!(
                        "WAYFARER_MAILER_SMTP_TLS: unknown mode {other}"
                    )));
                }
            };

            TransportConfig::Smtp(SmtpRelay {
                port,
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                tls,
                ..SmtpRelay::new(host)
            })
        } else {
            TransportConfig::File {
                output_dir: var("FILE_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./emails")),
            }
        };

        let config = Self {
            transport,
            from_address: var("FROM_ADDRESS").unwrap_or(defaults.from_address),
            from_name: var("FROM_NAME").or(defaults.from_name),
            app_name: var("APP_NAME").unwrap_or(defaults.app_name),
            app_url: var("APP_URL").unwrap_or(defaults.app_url),
            verification_path: var("VERIFICATION_PATH").unwrap_or(defaults.verification_path),
            reset_path: var("RESET_PATH").unwrap_or(defaults.reset_path),
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MailerError> {
        if self.from_address.parse::<lettre::Address>().is_err() {
            return Err(MailerError::Config(format!(
                "invalid from address: {}",
                self.from_address
            )));
        }
        if !(self.app_url.starts_with("http://") || self.app_url.starts_with("https://")) {
            return Err(MailerError::Config(format!(
                "app_url must be an http(s) URL: {}",
                self.app_url
            )));
        }
        Ok(())
    }

    pub fn build_transport(&self) -> Result<Box<dyn Mailer>, MailerError> {
        match &self.transport {
            TransportConfig::Smtp(relay) => Ok(Box::new(SmtpTransport::connect(relay)?)),
            TransportConfig::File { output_dir } => Ok(Box::new(FileTransport::new(output_dir)?)),
        }
    }

    pub fn get_from_address(&self) -> String {
        if let Some(name) = &self.from_name {
            format!("{} <{}>", name, self.from_address)
        } else {
            self.from_address.clone()
        }
    }

    pub fn verification_link(&self, token: &str) -> String {
        self.link(&self.verification_path, token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        self.link(&self.reset_path, token)
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}{}?token={}", self.app_url.trim_end_matches('/'), path, token)
    }

    pub fn template_context(&self) -> TemplateContext {
        TemplateContext {
            app_name: self.app_name.clone(),
            app_url: self.app_url.clone(),
            user_name: None,
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::File {
                output_dir: PathBuf::from("./emails"),
            },
            from_address: "noreply@example.com".to_string(),
            from_name: None,
            app_name: "Wayfarer Admin".to_string(),
            app_url: "http://localhost:3000".to_string(),
            verification_path: default_verification_path(),
            reset_path: default_reset_path(),
        }
    }
}
