use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use verimail_types::api::{RegisterInput, RegisterOutcome};
use verimail_types::validate;

use crate::error::{FailureKind, FlowError, Operation, fault};
use crate::handlers::raw_json;
use crate::verification::VerificationFlow;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub flow: VerificationFlow,
}

impl VerificationFlow {
    /// Create an account and send its first verification link.
    ///
    /// The account exists once this returns `Created`, whatever the
    /// nested verification outcome says.
    pub async fn register(&self, raw: Value) -> Result<RegisterOutcome, FlowError> {
        const OP: Operation = Operation::Register;

        let input: RegisterInput = match validate::parse(raw) {
            Ok(input) => input,
            Err(e) => {
                debug!("Rejected registration: {}", e);
                return Ok(RegisterOutcome::InvalidInput);
            }
        };

        let existing = self
            .directory
            .find_by_email(&input.email)
            .await
            .map_err(fault(OP, FailureKind::Lookup))?;
        if existing.is_some() {
            return Ok(RegisterOutcome::Conflict);
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .map_err(fault(OP, FailureKind::PasswordHash))?
            .to_string();

        let user_id = Uuid::new_v4();
        let created = self
            .store
            .create_user(user_id, &input.email, &password_hash)
            .await
            .map_err(fault(OP, FailureKind::Persistence))?;
        if !created {
            // Lost a race with a concurrent registration for the same email.
            debug!("Registration for an existing email rejected on insert");
            return Ok(RegisterOutcome::Conflict);
        }
        info!("Registered user {}", user_id);

        let verification = self.issue_link(OP, &input.email).await?;

        Ok(RegisterOutcome::Created {
            user_id,
            verification,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let outcome = state
        .flow
        .register(raw_json(&body))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = match outcome {
        RegisterOutcome::InvalidInput => StatusCode::BAD_REQUEST,
        RegisterOutcome::Conflict => StatusCode::CONFLICT,
        RegisterOutcome::Created { .. } => StatusCode::CREATED,
    };

    Ok((status, Json(outcome)))
}
