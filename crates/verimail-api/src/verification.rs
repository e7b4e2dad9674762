use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use verimail_crypto::generate_verification_token;
use verimail_db::Database;
use verimail_mail::{Mailer, OutgoingEmail, templates};
use verimail_types::api::{EmailInput, MarkVerifiedOutcome, ResendOutcome, TokenInput};
use verimail_types::validate;

use crate::error::{FailureKind, FlowError, Operation, fault};
use crate::gateway::{SqliteUsers, UserDirectory, UserStore};

#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Sender address on every outgoing message.
    pub email_from: String,
    /// Who receives contact-form enquiries.
    pub enquiry_recipients: Vec<String>,
    /// Base URL verification links point at.
    pub app_url: String,
    /// Tokens older than this no longer redeem. `None` disables expiry.
    pub token_ttl: Option<Duration>,
}

/// Sequences validation, lookup, token issue, persistence and delivery
/// for the verification and contact operations.
///
/// Each call runs start to finish on its own; the only state shared
/// between calls lives behind the injected gateways.
#[derive(Clone)]
pub struct VerificationFlow {
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) store: Arc<dyn UserStore>,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) config: Arc<FlowConfig>,
}

impl VerificationFlow {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        config: FlowConfig,
    ) -> Self {
        Self {
            directory,
            store,
            mailer,
            config: Arc::new(config),
        }
    }

    /// Wire both user gateways to one SQLite database.
    pub fn with_database(db: Arc<Database>, mailer: Arc<dyn Mailer>, config: FlowConfig) -> Self {
        let users = Arc::new(SqliteUsers::new(db));
        Self::new(users.clone(), users, mailer, config)
    }

    /// Issue a new token for `raw.email`, replacing any outstanding one,
    /// and email the link.
    pub async fn resend_verification_link(&self, raw: Value) -> Result<ResendOutcome, FlowError> {
        const OP: Operation = Operation::ResendVerificationLink;

        let input: EmailInput = match validate::parse(raw) {
            Ok(input) => input,
            Err(e) => {
                debug!("Rejected resend input: {}", e);
                return Ok(ResendOutcome::InvalidInput);
            }
        };

        let user = self
            .directory
            .find_by_email(&input.email)
            .await
            .map_err(fault(OP, FailureKind::Lookup))?;
        if user.is_none() {
            return Ok(ResendOutcome::NotFound);
        }

        self.issue_link(OP, &input.email).await
    }

    pub(crate) async fn issue_link(
        &self,
        op: Operation,
        email: &str,
    ) -> Result<ResendOutcome, FlowError> {
        let token = generate_verification_token().map_err(fault(op, FailureKind::TokenGeneration))?;

        let updated = self
            .store
            .set_verification_token(email, &token, Utc::now())
            .await
            .map_err(fault(op, FailureKind::Persistence))?;
        if !updated {
            // The row vanished between lookup and write; a link would be dead on arrival.
            warn!("No user row for {} when storing verification token", email);
            return Ok(ResendOutcome::Error);
        }

        let rendered = templates::verification_email(&self.config.app_url, email, &token)
            .map_err(fault(op, FailureKind::Rendering))?;
        let delivery = self
            .mailer
            .send(&OutgoingEmail {
                from: self.config.email_from.clone(),
                to: vec![email.to_string()],
                subject: templates::VERIFICATION_SUBJECT.to_string(),
                html: rendered.html,
                text: rendered.text,
                reply_to: None,
            })
            .await
            .map_err(fault(op, FailureKind::Delivery))?;

        if delivery.is_accepted() {
            info!("Verification link sent to {}", email);
            Ok(ResendOutcome::Success)
        } else {
            Ok(ResendOutcome::Error)
        }
    }

    /// Whether `raw.email` belongs to a verified account, read straight from
    /// the store. Bad input and unknown addresses both read as `false`.
    pub async fn check_verified(&self, raw: Value) -> Result<bool, FlowError> {
        let input: EmailInput = match validate::parse(raw) {
            Ok(input) => input,
            Err(e) => {
                debug!("Rejected verified-check input: {}", e);
                return Ok(false);
            }
        };

        let user = self
            .directory
            .find_by_email(&input.email)
            .await
            .map_err(fault(Operation::CheckVerified, FailureKind::Lookup))?;

        Ok(user.is_some_and(|u| u.is_verified()))
    }

    /// Redeem `raw.token`. A token that matches no row (unknown, already
    /// used, superseded or expired) is reported as `Error`.
    pub async fn mark_verified(&self, raw: Value) -> Result<MarkVerifiedOutcome, FlowError> {
        let input: TokenInput = match validate::parse(raw) {
            Ok(input) => input,
            Err(e) => {
                debug!("Rejected mark-verified input: {}", e);
                return Ok(MarkVerifiedOutcome::InvalidInput);
            }
        };

        let now = Utc::now();
        // A TTL reaching past the earliest representable instant means no cutoff.
        let issued_after = self.config.token_ttl.and_then(|ttl| now.checked_sub_signed(ttl));

        let updated = self
            .store
            .mark_verified(&input.token, now, issued_after)
            .await
            .map_err(fault(Operation::MarkVerified, FailureKind::Persistence))?;

        if updated {
            info!("Email verified");
            Ok(MarkVerifiedOutcome::Success)
        } else {
            Ok(MarkVerifiedOutcome::Error)
        }
    }
}
