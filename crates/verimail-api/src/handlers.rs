use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use verimail_types::api::{
    ContactOutcome, MarkVerifiedOutcome, ResendOutcome, StatusResponse, VerifiedResponse,
};

use crate::auth::AppState;

/// Request bodies are handed to the flows untyped; anything that is not
/// JSON becomes `null` and fails validation there.
pub(crate) fn raw_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// POST /email/verification — { email }
pub async fn resend_verification_link(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let outcome = state
        .flow
        .resend_verification_link(raw_json(&body))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = match outcome {
        ResendOutcome::Success => StatusCode::OK,
        ResendOutcome::InvalidInput => StatusCode::BAD_REQUEST,
        ResendOutcome::NotFound => StatusCode::NOT_FOUND,
        ResendOutcome::Error => StatusCode::BAD_GATEWAY,
    };

    Ok((status, Json(StatusResponse { status: outcome })))
}

/// GET /email/verified?email=
pub async fn check_verified(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, StatusCode> {
    let raw = serde_json::to_value(params).unwrap_or(Value::Null);

    let verified = state
        .flow
        .check_verified(raw)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(VerifiedResponse { verified }))
}

/// POST /email/verify — { token }
pub async fn mark_verified(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let outcome = state
        .flow
        .mark_verified(raw_json(&body))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = match outcome {
        MarkVerifiedOutcome::Success => StatusCode::OK,
        MarkVerifiedOutcome::InvalidInput | MarkVerifiedOutcome::Error => StatusCode::BAD_REQUEST,
    };

    Ok((status, Json(StatusResponse { status: outcome })))
}

/// POST /contact — { name, email, message }
pub async fn submit_contact_form(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let outcome = state
        .flow
        .submit_contact_form(raw_json(&body))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let status = match outcome {
        ContactOutcome::Success => StatusCode::OK,
        ContactOutcome::Error => StatusCode::BAD_GATEWAY,
    };

    Ok((status, Json(StatusResponse { status: outcome })))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
