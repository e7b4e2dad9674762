use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

const USER_COLUMNS: &str = "id, email, password, email_verified, email_verification_token, \
                            email_verification_sent_at, created_at";

/// Timestamps are written in one fixed RFC 3339 form so that string
/// comparison in SQL orders them correctly.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` when the email is already taken.
    pub fn create_user(&self, id: &str, email: &str, password_hash: Option<&str>) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, email, password_hash],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Verification --

    /// Store a freshly issued token on the user with `email`, replacing any
    /// outstanding one. Returns whether a row was updated.
    pub fn set_verification_token(
        &self,
        email: &str,
        token: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE users
                 SET email_verification_token = ?1, email_verification_sent_at = ?2
                 WHERE email = ?3",
                rusqlite::params![token, format_timestamp(sent_at), email],
            )?;
            Ok(affected > 0)
        })
    }

    /// Redeem `token`: stamp `email_verified` and clear the token in a single
    /// UPDATE. When `issued_after` is given, tokens sent before it match
    /// nothing. Returns whether a row was updated.
    pub fn mark_verified_by_token(
        &self,
        token: &str,
        verified_at: DateTime<Utc>,
        issued_after: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE users
                 SET email_verified = ?1,
                     email_verification_token = NULL,
                     email_verification_sent_at = NULL
                 WHERE email_verification_token = ?2
                   AND (?3 IS NULL OR email_verification_sent_at >= ?3)",
                rusqlite::params![
                    format_timestamp(verified_at),
                    token,
                    issued_after.map(format_timestamp),
                ],
            )?;
            Ok(affected > 0)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                email_verified: row.get(3)?,
                email_verification_token: row.get(4)?,
                email_verification_sent_at: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn db_with_user(email: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_user("00000000-0000-0000-0000-00000000000a", email, None).unwrap());
        db
    }

    #[test]
    fn lookup_by_email() {
        let db = db_with_user("a@x.com");
        let row = db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(row.email, "a@x.com");
        assert!(row.email_verified.is_none());
        assert!(row.email_verification_token.is_none());
        assert!(db.get_user_by_email("b@x.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = db_with_user("a@x.com");
        let created = db
            .create_user("00000000-0000-0000-0000-00000000000b", "a@x.com", None)
            .unwrap();
        assert!(!created);
        assert_eq!(
            db.get_user_by_email("a@x.com").unwrap().unwrap().id,
            "00000000-0000-0000-0000-00000000000a"
        );
    }

    #[test]
    fn set_token_reports_affected_row() {
        let db = db_with_user("a@x.com");
        assert!(db.set_verification_token("a@x.com", "tok1", Utc::now()).unwrap());
        assert!(!db.set_verification_token("nobody@x.com", "tok2", Utc::now()).unwrap());

        let row = db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(row.email_verification_token.as_deref(), Some("tok1"));
        assert!(row.email_verification_sent_at.is_some());
    }

    #[test]
    fn new_token_replaces_old() {
        let db = db_with_user("a@x.com");
        db.set_verification_token("a@x.com", "old", Utc::now()).unwrap();
        db.set_verification_token("a@x.com", "new", Utc::now()).unwrap();

        assert!(!db.mark_verified_by_token("old", Utc::now(), None).unwrap());
        assert!(db.mark_verified_by_token("new", Utc::now(), None).unwrap());
    }

    #[test]
    fn redeeming_sets_timestamp_and_clears_token() {
        let db = db_with_user("a@x.com");
        db.set_verification_token("a@x.com", "tok", Utc::now()).unwrap();

        assert!(db.mark_verified_by_token("tok", Utc::now(), None).unwrap());

        let row = db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert!(row.email_verified.is_some());
        assert!(row.email_verification_token.is_none());
        assert!(row.email_verification_sent_at.is_none());

        // Second redemption finds nothing.
        assert!(!db.mark_verified_by_token("tok", Utc::now(), None).unwrap());
    }

    #[test]
    fn unknown_token_mutates_nothing() {
        let db = db_with_user("a@x.com");
        db.set_verification_token("a@x.com", "tok", Utc::now()).unwrap();

        assert!(!db.mark_verified_by_token("other", Utc::now(), None).unwrap());

        let row = db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert!(row.email_verified.is_none());
        assert_eq!(row.email_verification_token.as_deref(), Some("tok"));
    }

    #[test]
    fn expired_token_matches_nothing() {
        let db = db_with_user("a@x.com");
        let sent_at = Utc::now() - Duration::hours(48);
        db.set_verification_token("a@x.com", "tok", sent_at).unwrap();

        let cutoff = Utc::now() - Duration::hours(24);
        assert!(!db.mark_verified_by_token("tok", Utc::now(), Some(cutoff)).unwrap());

        let cutoff = Utc::now() - Duration::hours(72);
        assert!(db.mark_verified_by_token("tok", Utc::now(), Some(cutoff)).unwrap());
    }
}
