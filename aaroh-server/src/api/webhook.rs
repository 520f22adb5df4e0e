//! Payment gateway webhook receiver.

use aaroh_core::lifecycle::{LifecycleError, WebhookOutcome};
use aaroh_sdk::objects::WebhookAck;
use axum::{Json, extract::State, response::IntoResponse};
use bytes::Bytes;

use super::error::ApiError;
use super::extractors::WebhookSignature;
use crate::state::AppState;

/// `POST /api/webhooks/payment`
///
/// The signature covers the raw body, so the body is taken as bytes and only
/// parsed once verified. Repeated deliveries are acknowledged with 200.
pub(super) async fn payment_webhook(
    state: State<AppState>,
    WebhookSignature(signature): WebhookSignature,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .lifecycle()
        .await
        .apply_webhook(&body, signature.as_deref())
        .await
        .map_err(|e| {
            match &e {
                LifecycleError::SignatureInvalid => {
                    tracing::warn!("Rejected webhook with an invalid signature");
                }
                LifecycleError::NotFound => {
                    tracing::warn!("Webhook references an unknown order");
                }
                _ => {}
            }
            ApiError::from(e)
        })?;

    match outcome {
        WebhookOutcome::Applied => tracing::debug!("Webhook applied"),
        WebhookOutcome::AlreadyApplied => tracing::debug!("Webhook already applied"),
        WebhookOutcome::Ignored => tracing::debug!("Webhook event ignored"),
    }
    Ok(Json(WebhookAck::ok()))
}
