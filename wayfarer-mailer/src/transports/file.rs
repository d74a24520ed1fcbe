use crate::{Email, Mailer, MailerError};
use async_trait::async_trait;
use lettre::{AsyncFileTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes every message as an `.eml` file into a directory instead of sending it.
#[derive(Debug, Clone)]
pub struct FileTransport {
    transport: AsyncFileTransport<Tokio1Executor>,
    output_dir: PathBuf,
}

impl FileTransport {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self, MailerError> {
        let output_dir = output_dir.as_ref().to_path_buf();

        if !output_dir.exists() {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            transport: AsyncFileTransport::<Tokio1Executor>::new(&output_dir),
            output_dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl Mailer for FileTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let message = Message::try_from(email)?;
        let id = self.transport.send(message).await?;
        debug!(message_id = %id, dir = %self.output_dir.display(), "Email written to file");
        Ok(())
    }
}
