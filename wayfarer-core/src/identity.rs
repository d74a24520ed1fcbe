//! Identities whose email address or password is being recovered
//!
//! An identity is owned by the surrounding admin application; this crate only reads it by
//! email and applies the two recovery effects (mark verified, replace password hash).
//!
//! | Field               | Type               | Description                                     |
//! | ------------------- | ------------------ | ----------------------------------------------- |
//! | `id`                | `IdentityId`       | Stable unique identifier.                       |
//! | `email`             | `String`           | Unique, normalized (trimmed, lower-case) email. |
//! | `name`              | `Option<String>`   | Display name used in notification emails.       |
//! | `email_verified_at` | `Option<DateTime>` | `None` until the email has been verified.       |
//! | `created_at`        | `DateTime`         | Creation time.                                  |
//! | `updated_at`        | `DateTime`         | Last modification time.                         |
//!
//! The password hash is deliberately not part of [`Identity`]; it is only reachable through
//! [`IdentityRepository`](crate::IdentityRepository).
use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    validation::normalize_email,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(id: &str) -> Self {
        IdentityId(id.to_string())
    }

    pub fn new_random() -> Self {
        IdentityId(generate_prefixed_id("idn"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "idn")
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub name: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Input for creating an identity in a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdentity {
    pub id: IdentityId,
    pub email: String,
    pub name: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl NewIdentity {
    pub fn builder() -> NewIdentityBuilder {
        NewIdentityBuilder::default()
    }
}

#[derive(Default)]
pub struct NewIdentityBuilder {
    id: Option<IdentityId>,
    email: Option<String>,
    name: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
}

impl NewIdentityBuilder {
    pub fn id(mut self, id: IdentityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email_verified_at(mut self, email_verified_at: Option<DateTime<Utc>>) -> Self {
        self.email_verified_at = email_verified_at;
        self
    }

    pub fn build(self) -> Result<NewIdentity, Error> {
        let email = self
            .email
            .ok_or(ValidationError::MissingField("Email is required".to_string()))?;

        Ok(NewIdentity {
            id: self.id.unwrap_or_default(),
            email: normalize_email(&email),
            name: self.name,
            email_verified_at: self.email_verified_at,
        })
    }
}
