use crate::MailerError;
use lettre::{
    Message,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
};
use serde::{Deserialize, Serialize};

/// Message content. Rendered recovery mail always carries both parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Text(String),
    Html(String),
    Alternative { text: String, html: String },
}

impl Body {
    pub fn text(&self) -> Option<&str> {
        match self {
            Body::Text(text) | Body::Alternative { text, .. } => Some(text),
            Body::Html(_) => None,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            Body::Html(html) | Body::Alternative { html, .. } => Some(html),
            Body::Text(_) => None,
        }
    }
}

/// A message addressed to a single identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: Body,
}

impl Email {
    /// Both addresses must parse as mailboxes (`Name <addr>` or a bare address).
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: Body,
    ) -> Result<Self, MailerError> {
        let email = Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body,
        };

        if email.subject.trim().is_empty() {
            return Err(MailerError::Builder("subject is empty".to_string()));
        }
        email.from.parse::<Mailbox>()?;
        email.to.parse::<Mailbox>()?;

        Ok(email)
    }
}

impl TryFrom<Email> for Message {
    type Error = MailerError;

    fn try_from(email: Email) -> Result<Self, Self::Error> {
        let headers = Message::builder()
            .from(email.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject);

        let message = match email.body {
            Body::Text(text) => headers.header(ContentType::TEXT_PLAIN).body(text)?,
            Body::Html(html) => headers.header(ContentType::TEXT_HTML).body(html)?,
            Body::Alternative { text, html } => headers.multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(text))
                    .singlepart(SinglePart::html(html)),
            )?,
        };

        Ok(message)
    }
}
