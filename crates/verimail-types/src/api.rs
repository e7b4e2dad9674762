use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Inputs --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailInput {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailTokenInput {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenInput {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

// -- Outcomes --

/// Result of asking for a fresh verification link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResendOutcome {
    InvalidInput,
    NotFound,
    Error,
    Success,
}

/// Result of redeeming a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkVerifiedOutcome {
    InvalidInput,
    Error,
    Success,
}

/// Result of relaying a contact-form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactOutcome {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum RegisterOutcome {
    InvalidInput,
    Conflict,
    Created {
        user_id: Uuid,
        verification: ResendOutcome,
    },
}

// -- Responses --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse<T> {
    pub status: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifiedResponse {
    pub verified: bool,
}
