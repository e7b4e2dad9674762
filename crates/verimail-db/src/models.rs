/// Database row types — these map directly to SQLite rows.
/// Distinct from verimail-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: Option<String>,
    pub email_verified: Option<String>,
    pub email_verification_token: Option<String>,
    pub email_verification_sent_at: Option<String>,
    pub created_at: String,
}
