use serde_json::Value;
use tracing::{debug, info};

use verimail_mail::{OutgoingEmail, templates};
use verimail_types::api::{ContactInput, ContactOutcome};
use verimail_types::validate;

use crate::error::{FailureKind, FlowError, Operation, fault};
use crate::verification::VerificationFlow;

impl VerificationFlow {
    /// Forward a contact-form submission to the enquiry inbox.
    /// Nothing is persisted.
    pub async fn submit_contact_form(&self, raw: Value) -> Result<ContactOutcome, FlowError> {
        let input: ContactInput = match validate::parse(raw) {
            Ok(input) => input,
            Err(e) => {
                debug!("Rejected contact form: {}", e);
                return Ok(ContactOutcome::Error);
            }
        };

        let rendered = templates::enquiry_email(&input.name, &input.email, &input.message)
            .map_err(fault(Operation::SubmitContactForm, FailureKind::Rendering))?;
        let delivery = self
            .mailer
            .send(&OutgoingEmail {
                from: self.config.email_from.clone(),
                to: self.config.enquiry_recipients.clone(),
                subject: templates::ENQUIRY_SUBJECT.to_string(),
                html: rendered.html,
                text: rendered.text,
                reply_to: Some(input.email),
            })
            .await
            .map_err(fault(Operation::SubmitContactForm, FailureKind::Delivery))?;

        if delivery.is_accepted() {
            info!("Enquiry from {} forwarded", input.name);
            Ok(ContactOutcome::Success)
        } else {
            Ok(ContactOutcome::Error)
        }
    }
}
