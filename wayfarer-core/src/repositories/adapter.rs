use crate::{
    Error, Identity, IdentityId, NewIdentity,
    repositories::{IdentityRepository, RepositoryProvider, TokenRepository},
    token::{NewToken, Token, TokenId, TokenKind},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Adapter that exposes the identity repository of a shared [`RepositoryProvider`]
pub struct IdentityRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> IdentityRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> IdentityRepository for IdentityRepositoryAdapter<R> {
    async fn create(&self, identity: NewIdentity) -> Result<Identity, Error> {
        self.provider.identity().create(identity).await
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, Error> {
        self.provider.identity().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, Error> {
        self.provider.identity().find_by_email(email).await
    }

    async fn mark_verified(&self, id: &IdentityId, at: DateTime<Utc>) -> Result<(), Error> {
        self.provider.identity().mark_verified(id, at).await
    }

    async fn update_password_hash(&self, id: &IdentityId, hash: &str) -> Result<(), Error> {
        self.provider.identity().update_password_hash(id, hash).await
    }

    async fn get_password_hash(&self, id: &IdentityId) -> Result<Option<String>, Error> {
        self.provider.identity().get_password_hash(id).await
    }
}

/// Adapter that exposes the token repository of a shared [`RepositoryProvider`]
pub struct TokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> TokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> TokenRepository for TokenRepositoryAdapter<R> {
    async fn create(&self, token: NewToken) -> Result<Token, Error> {
        self.provider.token().create(token).await
    }

    async fn find_by_value(&self, kind: TokenKind, value: &str) -> Result<Option<Token>, Error> {
        self.provider.token().find_by_value(kind, value).await
    }

    async fn find_by_email(&self, kind: TokenKind, email: &str) -> Result<Option<Token>, Error> {
        self.provider.token().find_by_email(kind, email).await
    }

    async fn delete(&self, kind: TokenKind, id: &TokenId) -> Result<(), Error> {
        self.provider.token().delete(kind, id).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.token().delete_expired(now).await
    }
}
