//! Custom song ordering request/response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeliveryType, OrderStatus};

/// Request body for ordering a custom song.
///
/// Every text field is required and must be non-blank; the amount is
/// never taken from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomSongOrder {
    pub occasion: String,
    pub recipient_name: String,
    pub story: String,
    pub mood: String,
    pub style: String,
    pub language: String,
    pub length: String,
    pub delivery_type: DeliveryType,
}

/// A custom song order as seen by its buyer.
///
/// `full_audio_url` is only populated once the order is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSongOrderResponse {
    pub order_id: Uuid,
    pub occasion: String,
    pub recipient_name: String,
    pub mood: String,
    pub style: String,
    pub language: String,
    pub length: String,
    pub delivery_type: DeliveryType,
    pub amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub preview_url: Option<String>,
    pub poster_url: Option<String>,
    pub full_audio_url: Option<String>,
    pub created_at: i64,
}

/// Current custom song prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSongPricing {
    pub standard_price: rust_decimal::Decimal,
    pub express_price: rust_decimal::Decimal,
}
