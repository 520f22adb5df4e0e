use crate::entities::payable_order::OrderRef;
use uuid::Uuid;

/// Something a buyer or the admin should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A purchase or custom song order was created.
    OrderCreated { order: OrderRef },
    /// A custom song preview was attached; the order is now payable.
    PreviewReady { order_id: Uuid },
    /// An order transitioned to `completed`. Emitted at most once per order.
    PaymentCompleted { order: OrderRef },
    /// The gateway reported a failed payment attempt.
    PaymentFailed {
        order: OrderRef,
        reason: Option<String>,
    },
    /// A login code was issued.
    OtpRequested { email: String, code: String },
}

impl NotificationEvent {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::OrderCreated { .. } => "order_created",
            NotificationEvent::PreviewReady { .. } => "preview_ready",
            NotificationEvent::PaymentCompleted { .. } => "payment_completed",
            NotificationEvent::PaymentFailed { .. } => "payment_failed",
            NotificationEvent::OtpRequested { .. } => "otp_requested",
        }
    }
}
