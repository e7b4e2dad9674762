use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Delivery, Mailer, OutgoingEmail};

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone)]
pub struct ResendOptions {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Transactional email via the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(options: ResendOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("verimail/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: options.api_key,
            endpoint: format!("{}/emails", options.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Delivery> {
        let body = SendEmailBody {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            reply_to: email.reply_to.as_deref(),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Request to Resend failed")?;

        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            warn!("Resend rejected email (status={}): {}", status, reason);
            return Ok(Delivery::Rejected {
                status: status.as_u16(),
                reason,
            });
        }

        let sent: SendEmailResponse = resp
            .json()
            .await
            .context("Failed to parse Resend response")?;
        debug!("Resend accepted email {}", sent.id);

        Ok(Delivery::Accepted { id: sent.id })
    }
}
