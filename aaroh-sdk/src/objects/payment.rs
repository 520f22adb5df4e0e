//! Payment intent and confirmation types shared by purchases and custom songs.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;

/// Everything the checkout client needs to open the gateway's payment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub order_id: Uuid,
    pub external_order_id: String,
    /// Amount in minor currency units (e.g. paise).
    pub amount: i64,
    pub currency: CompactString,
    /// Public gateway key the client opens the checkout with.
    pub key_id: String,
}

/// Callback payload the checkout client forwards after the gateway reports
/// a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub order_id: Uuid,
    pub external_order_id: String,
    pub external_payment_id: String,
    pub external_signature: String,
}

/// Short order summary returned after a confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub external_payment_id: Option<String>,
}

/// Payment state an admin can force an order into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminPaymentStatus {
    Paid,
    Unpaid,
}

/// Request body for `PATCH …/payment` on the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPaymentStatusRequest {
    pub status: AdminPaymentStatus,
}
