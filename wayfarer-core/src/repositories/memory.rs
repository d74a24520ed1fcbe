//! In-memory repositories
//!
//! Process-local implementations of [`TokenRepository`] and [`IdentityRepository`] with the
//! same uniqueness and conflict behaviour as the SQL backends. Useful for tests and for
//! embedding the recovery flows without a database.

use crate::{
    Error, Identity, IdentityId, NewIdentity,
    crypto::hash_token,
    error::StorageError,
    repositories::{
        IdentityRepository, IdentityRepositoryProvider, RepositoryProvider, TokenRepository,
        TokenRepositoryProvider,
    },
    token::{NewToken, Token, TokenId, TokenKind},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: Mutex<HashMap<TokenId, Token>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens of `kind`, expired ones included.
    pub async fn count(&self, kind: TokenKind) -> usize {
        self.tokens
            .lock()
            .await
            .values()
            .filter(|t| t.kind == kind)
            .count()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, new_token: NewToken) -> Result<Token, Error> {
        let token = new_token.to_token();
        let mut tokens = self.tokens.lock().await;

        for existing in tokens.values().filter(|t| t.kind == token.kind) {
            if existing.value_hash == token.value_hash {
                return Err(StorageError::Conflict("token value already in use".to_string()).into());
            }
            if existing.email == token.email {
                return Err(StorageError::Conflict(format!(
                    "a {} token already exists for this email",
                    token.kind
                ))
                .into());
            }
        }

        tokens.insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn find_by_value(&self, kind: TokenKind, value: &str) -> Result<Option<Token>, Error> {
        let value_hash = hash_token(value);
        let tokens = self.tokens.lock().await;

        Ok(tokens
            .values()
            .find(|t| t.kind == kind && t.value_hash == value_hash)
            .filter(|t| t.matches(value))
            .cloned())
    }

    async fn find_by_email(&self, kind: TokenKind, email: &str) -> Result<Option<Token>, Error> {
        let tokens = self.tokens.lock().await;

        Ok(tokens
            .values()
            .find(|t| t.kind == kind && t.email == email)
            .cloned())
    }

    async fn delete(&self, kind: TokenKind, id: &TokenId) -> Result<(), Error> {
        let mut tokens = self.tokens.lock().await;
        if tokens.get(id).is_some_and(|t| t.kind == kind) {
            tokens.remove(id);
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let mut tokens = self.tokens.lock().await;
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - tokens.len()) as u64)
    }
}

#[derive(Debug, Clone)]
struct IdentityRecord {
    identity: Identity,
    password_hash: Option<String>,
}

#[derive(Default)]
pub struct InMemoryIdentityRepository {
    records: DashMap<IdentityId, IdentityRecord>,
    emails: DashMap<String, IdentityId>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, new_identity: NewIdentity) -> Result<Identity, Error> {
        let now = Utc::now();
        let identity = Identity {
            id: new_identity.id,
            email: new_identity.email,
            name: new_identity.name,
            email_verified_at: new_identity.email_verified_at,
            created_at: now,
            updated_at: now,
        };

        match self.emails.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(format!(
                "identity with email {} already exists",
                identity.email
            ))
            .into()),
            Entry::Vacant(slot) => {
                slot.insert(identity.id.clone());
                self.records.insert(
                    identity.id.clone(),
                    IdentityRecord {
                        identity: identity.clone(),
                        password_hash: None,
                    },
                );
                Ok(identity)
            }
        }
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, Error> {
        Ok(self.records.get(id).map(|r| r.identity.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, Error> {
        let Some(id) = self.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn mark_verified(&self, id: &IdentityId, at: DateTime<Utc>) -> Result<(), Error> {
        let mut record = self.records.get_mut(id).ok_or(StorageError::NotFound)?;
        record.identity.email_verified_at = Some(at);
        record.identity.updated_at = at;
        Ok(())
    }

    async fn update_password_hash(&self, id: &IdentityId, hash: &str) -> Result<(), Error> {
        let mut record = self.records.get_mut(id).ok_or(StorageError::NotFound)?;
        record.password_hash = Some(hash.to_string());
        record.identity.updated_at = Utc::now();
        Ok(())
    }

    async fn get_password_hash(&self, id: &IdentityId) -> Result<Option<String>, Error> {
        Ok(self
            .records
            .get(id)
            .and_then(|r| r.password_hash.clone()))
    }
}

/// Both in-memory repositories behind the [`RepositoryProvider`] interface.
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    identity: InMemoryIdentityRepository,
    token: InMemoryTokenRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityRepositoryProvider for InMemoryRepositoryProvider {
    type IdentityRepo = InMemoryIdentityRepository;

    fn identity(&self) -> &Self::IdentityRepo {
        &self.identity
    }
}

impl TokenRepositoryProvider for InMemoryRepositoryProvider {
    type TokenRepo = InMemoryTokenRepository;

    fn token(&self) -> &Self::TokenRepo {
        &self.token
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
