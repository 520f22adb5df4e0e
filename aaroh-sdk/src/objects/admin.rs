//! Admin API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeliveryType, OrderStatus};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Full custom song order detail for the admin back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCustomSongResponse {
    pub order_id: Uuid,
    pub user_email: String,
    pub occasion: String,
    pub recipient_name: String,
    pub story: String,
    pub mood: String,
    pub style: String,
    pub language: String,
    pub length: String,
    pub delivery_type: DeliveryType,
    pub amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub preview_url: Option<String>,
    pub full_audio_url: Option<String>,
    pub poster_url: Option<String>,
    pub is_approved: bool,
    pub admin_reset_count: i32,
    pub external_order_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Full purchase detail for the admin back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPurchaseResponse {
    pub purchase_id: Uuid,
    pub user_email: String,
    pub course_id: Uuid,
    pub amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub admin_reset_count: i32,
    pub external_order_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Attach a preview (and optionally a poster) to a custom song order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPreviewRequest {
    pub preview_url: String,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// Attach the full track to a custom song order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFullAudioRequest {
    pub full_audio_url: String,
}

/// Production status an admin may move a custom song order to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    InProgress,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSongStatusRequest {
    pub status: ProductionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub is_approved: bool,
}

/// Replace the custom song prices. Existing orders keep their amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePricingRequest {
    pub standard_price: rust_decimal::Decimal,
    pub express_price: rust_decimal::Decimal,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 100_000;

/// Query parameters for listing custom song orders.
#[derive(Debug, Clone, Deserialize)]
pub struct ListCustomSongsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub status: Option<OrderStatus>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}
