//! Test doubles shared by the flow tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use verimail_db::Database;
use verimail_mail::{Delivery, Mailer, OutgoingEmail};
use verimail_types::models::User;

use crate::gateway::{SqliteUsers, UserDirectory, UserStore};
use crate::verification::{FlowConfig, VerificationFlow};

#[derive(Clone, Copy)]
pub enum MailMode {
    Accept,
    Reject,
    Fail,
}

pub struct RecordingMailer {
    mode: MailMode,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn new(mode: MailMode) -> Self {
        Self {
            mode,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Delivery> {
        match self.mode {
            MailMode::Accept => {
                self.sent.lock().unwrap().push(email.clone());
                Ok(Delivery::Accepted { id: "test".into() })
            }
            MailMode::Reject => Ok(Delivery::Rejected {
                status: 422,
                reason: "rejected".into(),
            }),
            MailMode::Fail => Err(anyhow!("connection reset")),
        }
    }
}

/// Forwards to SQLite and counts every write attempt.
pub struct CountingStore {
    inner: Arc<SqliteUsers>,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for CountingStore {
    async fn create_user(&self, id: Uuid, email: &str, password_hash: &str) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create_user(id, email, password_hash).await
    }

    async fn set_verification_token(
        &self,
        email: &str,
        token: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_verification_token(email, token, sent_at).await
    }

    async fn mark_verified(
        &self,
        token: &str,
        verified_at: DateTime<Utc>,
        issued_after: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.mark_verified(token, verified_at, issued_after).await
    }
}

/// Every call fails as if the database were gone.
pub struct BrokenUsers;

#[async_trait]
impl UserDirectory for BrokenUsers {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
        Err(anyhow!("database is locked"))
    }
}

#[async_trait]
impl UserStore for BrokenUsers {
    async fn create_user(&self, _id: Uuid, _email: &str, _password_hash: &str) -> Result<bool> {
        Err(anyhow!("database is locked"))
    }

    async fn set_verification_token(
        &self,
        _email: &str,
        _token: &str,
        _sent_at: DateTime<Utc>,
    ) -> Result<bool> {
        Err(anyhow!("database is locked"))
    }

    async fn mark_verified(
        &self,
        _token: &str,
        _verified_at: DateTime<Utc>,
        _issued_after: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        Err(anyhow!("database is locked"))
    }
}

/// Never finds anyone, like a lookup that ran before a concurrent insert.
pub struct StaleDirectory;

#[async_trait]
impl UserDirectory for StaleDirectory {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
        Ok(None)
    }
}

pub fn config() -> FlowConfig {
    FlowConfig {
        email_from: "Verimail <noreply@verimail.test>".into(),
        enquiry_recipients: vec!["owner@verimail.test".into()],
        app_url: "https://app.verimail.test".into(),
        token_ttl: None,
    }
}

pub struct Harness {
    pub flow: VerificationFlow,
    pub db: Arc<Database>,
    pub users: Arc<SqliteUsers>,
    pub store: Arc<CountingStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    /// Insert a user directly, bypassing the counted store.
    pub async fn seed(&self, email: &str) {
        assert!(self.users.create_user(Uuid::new_v4(), email, "hash").await.unwrap());
    }

    pub async fn token_of(&self, email: &str) -> Option<String> {
        self.users
            .find_by_email(email)
            .await
            .unwrap()
            .and_then(|u| u.email_verification_token)
    }

    pub fn password_of(&self, email: &str) -> String {
        self.db
            .get_user_by_email(email)
            .unwrap()
            .and_then(|row| row.password)
            .unwrap()
    }
}

pub fn harness(mode: MailMode) -> Harness {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let users = Arc::new(SqliteUsers::new(db.clone()));
    let store = Arc::new(CountingStore {
        inner: users.clone(),
        writes: AtomicUsize::new(0),
    });
    let mailer = Arc::new(RecordingMailer::new(mode));
    let flow = VerificationFlow::new(users.clone(), store.clone(), mailer.clone(), config());

    Harness {
        flow,
        db,
        users,
        store,
        mailer,
    }
}
