use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                          TEXT PRIMARY KEY,
                email                       TEXT NOT NULL UNIQUE,
                password                    TEXT,
                email_verified              TEXT,
                email_verification_token    TEXT UNIQUE,
                created_at                  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (verification sent_at)");
        conn.execute_batch(
            "
            ALTER TABLE users ADD COLUMN email_verification_sent_at TEXT;

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
