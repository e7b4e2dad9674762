use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use verimail_db::Database;
use verimail_db::models::UserRow;
use verimail_types::models::User;

/// Read side of the user table.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// Write side of the user table. Updates report whether a row matched.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `false` when another account already holds `email`.
    async fn create_user(&self, id: Uuid, email: &str, password_hash: &str) -> Result<bool>;

    async fn set_verification_token(
        &self,
        email: &str,
        token: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Stamp the owner of `token` as verified and clear the token in one write.
    async fn mark_verified(
        &self,
        token: &str,
        verified_at: DateTime<Utc>,
        issued_after: Option<DateTime<Utc>>,
    ) -> Result<bool>;
}

/// Both gateways backed by the SQLite database.
#[derive(Clone)]
pub struct SqliteUsers {
    db: Arc<Database>,
}

impl SqliteUsers {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // Run blocking DB work off the async runtime
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
    }
}

#[async_trait]
impl UserDirectory for SqliteUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        let row = self.run(move |db| db.get_user_by_email(&email)).await?;
        row.map(user_from_row).transpose()
    }
}

#[async_trait]
impl UserStore for SqliteUsers {
    async fn create_user(&self, id: Uuid, email: &str, password_hash: &str) -> Result<bool> {
        let email = email.to_string();
        let hash = password_hash.to_string();
        self.run(move |db| db.create_user(&id.to_string(), &email, Some(hash.as_str())))
            .await
    }

    async fn set_verification_token(
        &self,
        email: &str,
        token: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool> {
        let email = email.to_string();
        let token = token.to_string();
        self.run(move |db| db.set_verification_token(&email, &token, sent_at))
            .await
    }

    async fn mark_verified(
        &self,
        token: &str,
        verified_at: DateTime<Utc>,
        issued_after: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let token = token.to_string();
        self.run(move |db| db.mark_verified_by_token(&token, verified_at, issued_after))
            .await
    }
}

fn user_from_row(row: UserRow) -> Result<User> {
    Ok(User {
        id: row
            .id
            .parse()
            .map_err(|e| anyhow!("Corrupt user id '{}': {}", row.id, e))?,
        email_verified: row.email_verified.as_deref().map(parse_timestamp).transpose()?,
        email_verification_sent_at: row
            .email_verification_sent_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?,
        created_at: parse_timestamp(&row.created_at)?,
        email: row.email,
        email_verification_token: row.email_verification_token,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') default has no timezone: "YYYY-MM-DD HH:MM:SS".
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| anyhow!("Corrupt timestamp '{}': {}", s, e))
}
