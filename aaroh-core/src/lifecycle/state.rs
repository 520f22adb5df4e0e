//! Pure transition rules. Nothing here touches storage.

use crate::entities::OrderStatus;
use crate::entities::payable_order::{OrderKind, PayableOrder};

impl PayableOrder {
    /// Whether a payment intent may be created.
    ///
    /// Purchases are payable while `pending` and after a failed attempt;
    /// custom songs only once their preview is `ready`.
    pub fn is_payable(&self) -> bool {
        match self.kind {
            OrderKind::Purchase => {
                matches!(self.status, OrderStatus::Pending | OrderStatus::Failed)
            }
            OrderKind::CustomSong => self.status == OrderStatus::Ready,
        }
    }

    /// Whether a gateway result (capture or failure) may still change this order.
    pub fn accepts_payment_result(&self) -> bool {
        !matches!(self.status, OrderStatus::Completed | OrderStatus::Refunded)
    }

    /// Status a failed payment attempt moves the order to.
    ///
    /// A custom song keeps its status so the delivered preview stays
    /// payable.
    pub fn status_after_failure(&self) -> OrderStatus {
        match self.kind {
            OrderKind::Purchase => OrderStatus::Failed,
            OrderKind::CustomSong => self.status,
        }
    }

    /// Status an admin "mark unpaid" returns the order to.
    pub fn unpaid_status(&self) -> OrderStatus {
        match self.kind {
            OrderKind::Purchase => OrderStatus::Pending,
            OrderKind::CustomSong if self.has_preview => OrderStatus::Ready,
            OrderKind::CustomSong => OrderStatus::Pending,
        }
    }

    pub fn can_reset(&self) -> bool {
        self.status != OrderStatus::Refunded
    }
}

/// A preview may be attached while the song is in production or ready.
pub fn can_attach_preview(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Pending | OrderStatus::InProgress | OrderStatus::Ready
    )
}

/// `in_progress` / `failed` may only be set before a preview exists.
pub fn can_set_production_status(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Pending | OrderStatus::InProgress)
}
