use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use verimail_mail::resend::DEFAULT_BASE_URL;

/// Placeholder API keys that MUST NOT be used.
const PLACEHOLDER_KEYS: &[&str] = &["re_123456789", "change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub app_url: String,
    pub resend_api_key: String,
    pub resend_base_url: String,
    pub email_from: String,
    pub email_to: Vec<String>,
    pub mail_timeout: Duration,
    pub token_ttl: Option<chrono::Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| -> Result<String> {
            match get(key) {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => bail!("{key} is required"),
            }
        };

        let resend_api_key = required("RESEND_API_KEY")?;
        if PLACEHOLDER_KEYS.contains(&resend_api_key.as_str()) {
            bail!("RESEND_API_KEY is still a placeholder");
        }

        let email_to: Vec<String> = required("RESEND_EMAIL_TO")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if email_to.is_empty() {
            bail!("RESEND_EMAIL_TO must list at least one address");
        }

        let port: u16 = var("VERIMAIL_PORT", "3000")
            .parse()
            .context("VERIMAIL_PORT must be a port number")?;
        let mail_timeout_secs: u64 = var("VERIMAIL_MAIL_TIMEOUT_SECS", "10")
            .parse()
            .context("VERIMAIL_MAIL_TIMEOUT_SECS must be a whole number")?;
        let token_ttl = match get("VERIMAIL_TOKEN_TTL_HOURS") {
            Some(v) => Some(parse_ttl_hours(&v)?),
            None => None,
        };

        Ok(Self {
            host: var("VERIMAIL_HOST", "0.0.0.0"),
            port,
            db_path: var("VERIMAIL_DB_PATH", "verimail.db").into(),
            app_url: var("VERIMAIL_APP_URL", "http://localhost:3000"),
            resend_api_key,
            resend_base_url: var("RESEND_BASE_URL", DEFAULT_BASE_URL),
            email_from: required("RESEND_EMAIL_FROM")?,
            email_to,
            mail_timeout: Duration::from_secs(mail_timeout_secs),
            token_ttl,
        })
    }
}

fn parse_ttl_hours(raw: &str) -> Result<chrono::TimeDelta> {
    let hours: i64 = raw
        .trim()
        .parse()
        .context("VERIMAIL_TOKEN_TTL_HOURS must be a whole number")?;
    if hours <= 0 {
        bail!("VERIMAIL_TOKEN_TTL_HOURS must be positive");
    }
    chrono::TimeDelta::try_hours(hours).context("VERIMAIL_TOKEN_TTL_HOURS is too large")
}
