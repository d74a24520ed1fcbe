mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use common::Harness;
use wayfarer::{
    CredentialHasher, Error, RecoveryError, TokenKind, ValidationError,
};

/// Fast stand-in for Argon2.
struct PlainHasher;

#[async_trait]
impl CredentialHasher for PlainHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, Error> {
        Ok(format!("plain${plaintext}"))
    }
}

async fn harness() -> Harness {
    Harness::with_builder(|builder| builder.with_hasher(Arc::new(PlainHasher))).await
}

#[tokio::test]
async fn test_reset_with_argon2() {
    let harness = Harness::new().await;
    let identity = harness.create_identity("a@example.com").await;

    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    let value = harness.notifier.last_value(TokenKind::PasswordReset).await;
    assert!(harness.wayfarer.check_reset_link(&value).await.unwrap());

    harness
        .wayfarer
        .complete_reset(&value, "correct horse battery")
        .await
        .unwrap();

    let hash = harness.password_hash(&identity).await.unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(password_auth::verify_password("correct horse battery", &hash).is_ok());
    assert_eq!(
        harness.notifier.password_changed().await,
        vec!["a@example.com".to_string()]
    );

    let reuse = harness
        .wayfarer
        .complete_reset(&value, "another password")
        .await;
    assert!(matches!(
        reuse,
        Err(Error::Recovery(RecoveryError::InvalidOrUsedLink))
    ));
}

#[tokio::test]
async fn test_expired_reset_leaves_password_unchanged() {
    let harness = harness().await;
    let identity = harness.create_identity("a@example.com").await;

    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    let value = harness.notifier.last_value(TokenKind::PasswordReset).await;

    harness.clock.advance(Duration::minutes(61));
    let result = harness
        .wayfarer
        .complete_reset(&value, "new password 1")
        .await;
    assert!(matches!(
        result,
        Err(Error::Recovery(RecoveryError::LinkExpired))
    ));
    assert!(harness.password_hash(&identity).await.is_none());
}

#[tokio::test]
async fn test_only_latest_reset_link_is_accepted() {
    let harness = harness().await;
    let identity = harness.create_identity("a@example.com").await;

    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    let first = harness.notifier.last_value(TokenKind::PasswordReset).await;
    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    let second = harness.notifier.last_value(TokenKind::PasswordReset).await;

    let stale = harness.wayfarer.complete_reset(&first, "new password 1").await;
    assert!(matches!(
        stale,
        Err(Error::Recovery(RecoveryError::InvalidOrUsedLink))
    ));

    harness
        .wayfarer
        .complete_reset(&second, "new password 2")
        .await
        .unwrap();
    assert_eq!(
        harness.password_hash(&identity).await.as_deref(),
        Some("plain$new password 2")
    );
}

#[tokio::test]
async fn test_rejected_password_keeps_link_live() {
    let harness = harness().await;
    harness.create_identity("a@example.com").await;

    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    let value = harness.notifier.last_value(TokenKind::PasswordReset).await;

    let result = harness.wayfarer.complete_reset(&value, "short").await;
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::InvalidPassword(_)))
    ));
    assert!(harness.wayfarer.check_reset_link(&value).await.unwrap());
}

#[tokio::test]
async fn test_flows_do_not_share_tokens() {
    let harness = harness().await;
    harness.create_identity("a@example.com").await;

    harness
        .wayfarer
        .begin_verification("a@example.com")
        .await
        .unwrap();
    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    let verification = harness
        .notifier
        .last_value(TokenKind::EmailVerification)
        .await;

    let result = harness
        .wayfarer
        .complete_reset(&verification, "new password 1")
        .await;
    assert!(matches!(
        result,
        Err(Error::Recovery(RecoveryError::InvalidOrUsedLink))
    ));
    assert_eq!(harness.live_tokens(TokenKind::EmailVerification).await, 1);
    assert_eq!(harness.live_tokens(TokenKind::PasswordReset).await, 1);
}

#[tokio::test]
async fn test_concurrent_completions_apply_once() {
    let harness = Arc::new(harness().await);
    harness.create_identity("a@example.com").await;

    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    let value = harness.notifier.last_value(TokenKind::PasswordReset).await;

    let mut handles = Vec::new();
    for i in 0..4 {
        let harness = harness.clone();
        let value = value.clone();
        handles.push(tokio::spawn(async move {
            harness
                .wayfarer
                .complete_reset(&value, &format!("new password {i}"))
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert!(matches!(
                e,
                Error::Recovery(RecoveryError::InvalidOrUsedLink)
            )),
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(harness.notifier.password_changed().await.len(), 1);
}

#[tokio::test]
async fn test_cleanup_expired_tokens() {
    let harness = harness().await;
    harness.create_identity("a@example.com").await;
    harness.create_identity("b@example.com").await;

    harness.wayfarer.begin_reset("a@example.com").await.unwrap();
    harness
        .wayfarer
        .begin_verification("b@example.com")
        .await
        .unwrap();

    assert_eq!(harness.wayfarer.cleanup_expired_tokens().await.unwrap(), 0);

    // Reset links last an hour, verification links a day.
    harness.clock.advance(Duration::hours(1));
    assert_eq!(harness.wayfarer.cleanup_expired_tokens().await.unwrap(), 1);
    assert_eq!(harness.live_tokens(TokenKind::PasswordReset).await, 0);
    assert_eq!(harness.live_tokens(TokenKind::EmailVerification).await, 1);

    harness.clock.advance(Duration::hours(23));
    assert_eq!(harness.wayfarer.cleanup_expired_tokens().await.unwrap(), 1);
}
