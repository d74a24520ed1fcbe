//! Verification and reset tokens
//!
//! Both token families share one shape and are told apart by [`TokenKind`]. A stored
//! [`Token`] only carries the digest of its secret; the plaintext exists once, in the
//! [`IssuedToken`] returned by the issuer, and is handed straight to the notification channel.

use crate::{
    crypto::{hash_token, verify_token_hash},
    error::ValidationError,
    id::generate_prefixed_id,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::EmailVerification, TokenKind::PasswordReset];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::EmailVerification => "email_verification",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(TokenKind::EmailVerification),
            "password_reset" => Ok(TokenKind::PasswordReset),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown token kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: &str) -> Self {
        TokenId(id.to_string())
    }

    pub fn new_random() -> Self {
        TokenId(generate_prefixed_id("tok"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A token record as held by the token store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub kind: TokenKind,
    pub email: String,
    /// Hex SHA-256 digest of the token value.
    pub value_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// A token is valid only while `now < expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Constant-time check that `value` is the secret behind this record.
    pub fn matches(&self, value: &str) -> bool {
        verify_token_hash(value, &self.value_hash)
    }
}

/// Insert request for the token store. Carries the plaintext value; stores persist only
/// [`NewToken::value_hash`].
#[derive(Clone)]
pub struct NewToken {
    pub id: TokenId,
    pub kind: TokenKind,
    pub email: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewToken {
    pub fn new(
        kind: TokenKind,
        email: &str,
        value: String,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TokenId::new_random(),
            kind,
            email: email.to_string(),
            value,
            expires_at,
            created_at,
        }
    }

    pub fn value_hash(&self) -> String {
        hash_token(&self.value)
    }

    /// The stored form of this request.
    pub fn to_token(&self) -> Token {
        Token {
            id: self.id.clone(),
            kind: self.kind,
            email: self.email.clone(),
            value_hash: self.value_hash(),
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for NewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewToken")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("email", &self.email)
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A freshly issued token together with its plaintext value.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: Token,
    value: String,
}

impl IssuedToken {
    pub(crate) fn new(token: Token, value: String) -> Self {
        Self { token, value }
    }

    /// The secret to deliver to the end user. It is not recoverable from storage.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &self.token)
            .field("value", &"<redacted>")
            .finish()
    }
}
