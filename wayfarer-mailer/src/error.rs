use thiserror::Error;

/// Anything that can go wrong between rendering a message and handing it to a transport.
#[derive(Error, Debug)]
pub enum MailerError {
    #[error("smtp relay rejected the message: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("could not write message file: {0}")]
    File(#[from] lettre::transport::file::Error),

    #[error("invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("malformed message: {0}")]
    Message(#[from] lettre::error::Error),

    /// The message itself is incomplete, e.g. an empty subject.
    #[error("incomplete message: {0}")]
    Builder(String),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("invalid mailer configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
