use std::fmt;

use thiserror::Error;
use tracing::error;

/// The operation a [`FlowError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ResendVerificationLink,
    CheckVerified,
    MarkVerified,
    SubmitContactForm,
    Register,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ResendVerificationLink => "resending email verification link",
            Self::CheckVerified => "checking if email verified",
            Self::MarkVerified => "marking email as verified",
            Self::SubmitContactForm => "submitting contact form",
            Self::Register => "registering account",
        })
    }
}

/// Which collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Lookup,
    Persistence,
    TokenGeneration,
    Rendering,
    Delivery,
    PasswordHash,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lookup => "user lookup",
            Self::Persistence => "persistence",
            Self::TokenGeneration => "token generation",
            Self::Rendering => "email rendering",
            Self::Delivery => "email delivery",
            Self::PasswordHash => "password hashing",
        })
    }
}

/// An infrastructure fault inside one of the flows.
///
/// Expected outcomes (bad input, unknown user, rejected email) never take
/// this path; they come back as the operation's outcome enum.
#[derive(Debug, Error)]
#[error("error {operation}: {kind} failed")]
pub struct FlowError {
    pub operation: Operation,
    pub kind: FailureKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl FlowError {
    pub fn new(operation: Operation, kind: FailureKind, source: anyhow::Error) -> Self {
        Self {
            operation,
            kind,
            source: source.into(),
        }
    }
}

/// `map_err` adapter that logs the cause before wrapping it.
pub(crate) fn fault(operation: Operation, kind: FailureKind) -> impl FnOnce(anyhow::Error) -> FlowError {
    move |e| {
        error!("Error {}: {} failed: {:#}", operation, kind, e);
        FlowError::new(operation, kind, e)
    }
}
