pub mod auth;
pub mod contact;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod verification;

pub use error::{FailureKind, FlowError, Operation};
pub use verification::{FlowConfig, VerificationFlow};

#[cfg(test)]
mod test_support;
