pub mod resend;
pub mod templates;

use anyhow::Result;
use async_trait::async_trait;

pub use resend::{ResendMailer, ResendOptions};

/// A fully rendered message, ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: Option<String>,
}

/// What the provider said about a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accepted { id: String },
    Rejected { status: u16, reason: String },
}

impl Delivery {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Delivery::Accepted { .. })
    }
}

/// Outbound email gateway.
///
/// `Ok(Delivery::Rejected)` is an ordinary outcome (the provider refused the
/// message); `Err` means the provider could not be reached or answered with
/// something unintelligible.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<Delivery>;
}
