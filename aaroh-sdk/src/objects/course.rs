//! Course catalog and purchase request/response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;

/// A published course in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: rust_decimal::Decimal,
    pub created_at: i64,
}

/// Request body for starting a course checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseRequest {
    pub course_id: Uuid,
}

/// A course purchase as seen by its buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub purchase_id: Uuid,
    pub course_id: Uuid,
    pub amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub external_order_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
