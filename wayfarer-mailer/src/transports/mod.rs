mod file;
mod smtp;

pub use file::FileTransport;
pub use smtp::{SmtpRelay, SmtpTransport, TlsMode};
