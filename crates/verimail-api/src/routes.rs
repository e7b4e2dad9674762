use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::handlers;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/email/verification", post(handlers::resend_verification_link))
        .route("/email/verified", get(handlers::check_verified))
        .route("/email/verify", post(handlers::mark_verified))
        .route("/contact", post(handlers::submit_contact_form))
        .route("/health", get(handlers::health))
        .with_state(state)
}
