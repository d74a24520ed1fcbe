#![allow(dead_code)]

use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use wayfarer::{
    Error, Identity, IdentityRepository, IdentityRepositoryProvider, ManualClock, NewIdentity,
    NotificationChannel, RecoveryError, SqliteRepositoryProvider, TokenKind, Wayfarer,
    WayfarerBuilder, WithStorage,
};

pub const START: i64 = 1_700_000_000;

pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(START, 0).unwrap()
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, TokenKind, String)>>,
    password_changed: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn last_value(&self, kind: TokenKind) -> String {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(_, k, _)| *k == kind)
            .map(|(_, _, value)| value.clone())
            .expect("a token was delivered")
    }

    pub async fn delivered_values(&self, kind: TokenKind) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, value)| value.clone())
            .collect()
    }

    pub async fn delivered(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn password_changed(&self) -> Vec<String> {
        self.password_changed.lock().await.clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingNotifier {
    async fn send(&self, email: &str, kind: TokenKind, token: &str) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RecoveryError::NotificationFailed("mailbox unavailable".to_string()).into());
        }
        self.sent
            .lock()
            .await
            .push((email.to_string(), kind, token.to_string()));
        Ok(())
    }

    async fn send_password_changed(&self, email: &str) -> Result<(), Error> {
        self.password_changed.lock().await.push(email.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub wayfarer: Wayfarer<SqliteRepositoryProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_builder(|builder| builder).await
    }

    pub async fn with_builder<F>(configure: F) -> Self
    where
        F: FnOnce(
            WayfarerBuilder<WithStorage<SqliteRepositoryProvider>>,
        ) -> WayfarerBuilder<WithStorage<SqliteRepositoryProvider>>,
    {
        Self::connect("sqlite::memory:", configure).await
    }

    /// A harness over a database file, so the pool holds several connections.
    pub async fn on_file<F>(path: &Path, configure: F) -> Self
    where
        F: FnOnce(
            WayfarerBuilder<WithStorage<SqliteRepositoryProvider>>,
        ) -> WayfarerBuilder<WithStorage<SqliteRepositoryProvider>>,
    {
        Self::connect(&format!("sqlite://{}", path.display()), configure).await
    }

    async fn connect<F>(url: &str, configure: F) -> Self
    where
        F: FnOnce(
            WayfarerBuilder<WithStorage<SqliteRepositoryProvider>>,
        ) -> WayfarerBuilder<WithStorage<SqliteRepositoryProvider>>,
    {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(start()));

        let builder = WayfarerBuilder::new()
            .with_sqlite(url)
            .await
            .unwrap()
            .with_notifier(notifier.clone())
            .with_clock(clock.clone())
            .apply_migrations(true);

        let wayfarer = configure(builder).build().await.unwrap();

        Self {
            wayfarer,
            notifier,
            clock,
        }
    }

    pub async fn create_identity(&self, email: &str) -> Identity {
        let identity = NewIdentity::builder()
            .email(email)
            .name("Agent")
            .build()
            .unwrap();
        self.wayfarer
            .repositories()
            .identity()
            .create(identity)
            .await
            .unwrap()
    }

    pub async fn identity(&self, email: &str) -> Identity {
        self.wayfarer
            .repositories()
            .identity()
            .find_by_email(email)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn password_hash(&self, identity: &Identity) -> Option<String> {
        self.wayfarer
            .repositories()
            .identity()
            .get_password_hash(&identity.id)
            .await
            .unwrap()
    }

    pub async fn live_tokens(&self, kind: TokenKind) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM credential_tokens WHERE kind = ?1")
            .bind(kind.as_str())
            .fetch_one(self.wayfarer.repositories().pool())
            .await
            .unwrap()
    }
}
