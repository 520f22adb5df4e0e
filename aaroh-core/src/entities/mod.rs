pub mod course;
pub mod custom_song_order;
pub mod custom_song_settings;
pub mod order_summary;
pub mod payable_order;
pub mod purchase;

use aaroh_sdk::objects::{DeliveryType as SdkDeliveryType, OrderStatus as SdkOrderStatus};

/// Order status for database operations.
///
/// Shared by purchases and custom song orders; each entity only ever
/// stores the subset its lifecycle allows.
///
/// This is the sqlx::Type version. For API/DTO use, see `aaroh_sdk::objects::OrderStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "order_status")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Ready,
    Completed,
    Failed,
    Refunded,
}

impl From<OrderStatus> for SdkOrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Pending => SdkOrderStatus::Pending,
            OrderStatus::InProgress => SdkOrderStatus::InProgress,
            OrderStatus::Ready => SdkOrderStatus::Ready,
            OrderStatus::Completed => SdkOrderStatus::Completed,
            OrderStatus::Failed => SdkOrderStatus::Failed,
            OrderStatus::Refunded => SdkOrderStatus::Refunded,
        }
    }
}

impl From<SdkOrderStatus> for OrderStatus {
    fn from(value: SdkOrderStatus) -> Self {
        match value {
            SdkOrderStatus::Pending => OrderStatus::Pending,
            SdkOrderStatus::InProgress => OrderStatus::InProgress,
            SdkOrderStatus::Ready => OrderStatus::Ready,
            SdkOrderStatus::Completed => OrderStatus::Completed,
            SdkOrderStatus::Failed => OrderStatus::Failed,
            SdkOrderStatus::Refunded => OrderStatus::Refunded,
        }
    }
}

/// Delivery tier for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `aaroh_sdk::objects::DeliveryType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "delivery_type")]
pub enum DeliveryType {
    Standard,
    Express,
}

impl From<DeliveryType> for SdkDeliveryType {
    fn from(value: DeliveryType) -> Self {
        match value {
            DeliveryType::Standard => SdkDeliveryType::Standard,
            DeliveryType::Express => SdkDeliveryType::Express,
        }
    }
}

impl From<SdkDeliveryType> for DeliveryType {
    fn from(value: SdkDeliveryType) -> Self {
        match value {
            SdkDeliveryType::Standard => DeliveryType::Standard,
            SdkDeliveryType::Express => DeliveryType::Express,
        }
    }
}

/// Convert a database timestamp into unix seconds for API responses.
pub fn unix_timestamp(t: time::PrimitiveDateTime) -> i64 {
    t.assume_utc().unix_timestamp()
}

/// Current UTC time as stored in the database.
pub fn now_primitive() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}
