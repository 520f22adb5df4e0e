//! Payment gateway webhook envelope.
//!
//! The gateway posts events shaped like:
//!
//! ```json
//! {
//!   "event": "payment.captured",
//!   "payload": { "payment": { "entity": {
//!     "id": "pay_29QQoUBi66xm2f",
//!     "order_id": "order_9A33XWu170gUtm",
//!     "error_description": null
//!   } } }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Event types the backend reacts to. Anything else is acknowledged and
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "payment.captured")]
    PaymentCaptured,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: WebhookEventType,
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub payment: WebhookPaymentWrapper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPaymentWrapper {
    pub entity: PaymentEntity,
}

/// The payment the event is about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEntity {
    /// Gateway payment id.
    pub id: String,
    /// Gateway order id the payment belongs to.
    pub order_id: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl WebhookEnvelope {
    pub fn payment(&self) -> &PaymentEntity {
        &self.payload.payment.entity
    }
}

/// Response body for an accepted webhook, including idempotent no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
