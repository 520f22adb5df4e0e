//! A unified, payment-centric view over purchases and custom song orders.
//!
//! Both tables carry the same payment columns, so every payment transition
//! is written once against [`PayableOrder`] and dispatched to the right
//! table by [`OrderKind`]. All mutating queries are guarded conditional
//! updates: `None` means the guard did not match and nothing was written.

use super::OrderStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Purchase,
    CustomSong,
}

impl OrderKind {
    fn table(self) -> &'static str {
        match self {
            OrderKind::Purchase => "purchases",
            OrderKind::CustomSong => "custom_song_orders",
        }
    }

    fn payable_columns(self) -> &'static str {
        match self {
            OrderKind::Purchase => {
                "id, user_email, amount, status, external_order_id, external_payment_id, \
                 admin_reset_count, FALSE AS has_preview"
            }
            OrderKind::CustomSong => {
                "id, user_email, amount, status, external_order_id, external_payment_id, \
                 admin_reset_count, (preview_url IS NOT NULL) AS has_preview"
            }
        }
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Purchase => write!(f, "purchase"),
            OrderKind::CustomSong => write!(f, "custom_song"),
        }
    }
}

/// Identifies one order-like entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderRef {
    pub kind: OrderKind,
    pub id: Uuid,
}

impl OrderRef {
    pub fn purchase(id: Uuid) -> Self {
        Self {
            kind: OrderKind::Purchase,
            id,
        }
    }

    pub fn custom_song(id: Uuid) -> Self {
        Self {
            kind: OrderKind::CustomSong,
            id,
        }
    }
}

impl std::fmt::Display for OrderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// The payment-relevant projection of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayableOrder {
    pub kind: OrderKind,
    pub id: Uuid,
    pub user_email: String,
    pub amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub external_order_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub admin_reset_count: i32,
    /// Custom songs only: a preview has been delivered.
    pub has_preview: bool,
}

impl PayableOrder {
    pub fn order_ref(&self) -> OrderRef {
        OrderRef {
            kind: self.kind,
            id: self.id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PayableRow {
    id: Uuid,
    user_email: String,
    amount: rust_decimal::Decimal,
    status: OrderStatus,
    external_order_id: Option<String>,
    external_payment_id: Option<String>,
    admin_reset_count: i32,
    has_preview: bool,
}

impl PayableRow {
    fn into_order(self, kind: OrderKind) -> PayableOrder {
        PayableOrder {
            kind,
            id: self.id,
            user_email: self.user_email,
            amount: self.amount,
            status: self.status,
            external_order_id: self.external_order_id,
            external_payment_id: self.external_payment_id,
            admin_reset_count: self.admin_reset_count,
            has_preview: self.has_preview,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetPayableOrder {
    pub order: OrderRef,
}

impl Processor<GetPayableOrder> for DatabaseProcessor {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPayableOrder")]
    async fn process(&self, query: GetPayableOrder) -> Result<Option<PayableOrder>, sqlx::Error> {
        let kind = query.order.kind;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            kind.payable_columns(),
            kind.table()
        );
        let row = sqlx::query_as::<_, PayableRow>(&sql)
            .bind(query.order.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_order(kind)))
    }
}

#[derive(Debug, Clone)]
/// Find the order a gateway order id belongs to, across both tables.
pub struct FindPayableByExternalOrderId {
    pub external_order_id: String,
}

impl Processor<FindPayableByExternalOrderId> for DatabaseProcessor {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindPayableByExternalOrderId")]
    async fn process(
        &self,
        query: FindPayableByExternalOrderId,
    ) -> Result<Option<PayableOrder>, sqlx::Error> {
        for kind in [OrderKind::Purchase, OrderKind::CustomSong] {
            let sql = format!(
                "SELECT {} FROM {} WHERE external_order_id = $1",
                kind.payable_columns(),
                kind.table()
            );
            let row = sqlx::query_as::<_, PayableRow>(&sql)
                .bind(&query.external_order_id)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = row {
                return Ok(Some(row.into_order(kind)));
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Clone)]
/// Store a freshly created gateway order id.
///
/// Only applies while no gateway order is attached, so concurrent intent
/// creation keeps the first id.
pub struct AttachExternalOrder {
    pub order: OrderRef,
    pub external_order_id: String,
}

impl Processor<AttachExternalOrder> for DatabaseProcessor {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AttachExternalOrder")]
    async fn process(&self, cmd: AttachExternalOrder) -> Result<Option<PayableOrder>, sqlx::Error> {
        let kind = cmd.order.kind;
        let sql = format!(
            "UPDATE {} SET external_order_id = $2, updated_at = NOW() \
             WHERE id = $1 AND external_order_id IS NULL \
             RETURNING {}",
            kind.table(),
            kind.payable_columns()
        );
        let row = sqlx::query_as::<_, PayableRow>(&sql)
            .bind(cmd.order.id)
            .bind(cmd.external_order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_order(kind)))
    }
}

#[derive(Debug, Clone)]
/// Transition an order to `completed`.
///
/// Guarded on the order not already being `completed` or `refunded`; when
/// `external_order_id` is given it must also match the stored one. A
/// `None` result means another confirmation got there first.
pub struct MarkPaymentCompleted {
    pub order: OrderRef,
    pub external_order_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub external_signature: Option<String>,
}

impl Processor<MarkPaymentCompleted> for DatabaseProcessor {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkPaymentCompleted")]
    async fn process(
        &self,
        cmd: MarkPaymentCompleted,
    ) -> Result<Option<PayableOrder>, sqlx::Error> {
        let kind = cmd.order.kind;
        let sql = format!(
            "UPDATE {} \
             SET status = 'completed', \
                 external_payment_id = COALESCE($3, external_payment_id), \
                 external_signature = COALESCE($4, external_signature), \
                 updated_at = NOW() \
             WHERE id = $1 \
               AND ($2::text IS NULL OR external_order_id = $2) \
               AND status NOT IN ('completed', 'refunded') \
             RETURNING {}",
            kind.table(),
            kind.payable_columns()
        );
        let row = sqlx::query_as::<_, PayableRow>(&sql)
            .bind(cmd.order.id)
            .bind(cmd.external_order_id)
            .bind(cmd.external_payment_id)
            .bind(cmd.external_signature)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_order(kind)))
    }
}

#[derive(Debug, Clone)]
/// Record a failed payment attempt by moving the order to `status`.
///
/// Never touches a `completed` or `refunded` order, so a late failure
/// notification cannot downgrade a paid order. The failed gateway payment id
/// is remembered so a redelivered notification for the same attempt matches
/// nothing and returns `None`.
pub struct MarkPaymentFailed {
    pub order: OrderRef,
    pub external_order_id: String,
    pub external_payment_id: String,
    pub status: OrderStatus,
}

impl Processor<MarkPaymentFailed> for DatabaseProcessor {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkPaymentFailed")]
    async fn process(&self, cmd: MarkPaymentFailed) -> Result<Option<PayableOrder>, sqlx::Error> {
        let kind = cmd.order.kind;
        let sql = format!(
            "UPDATE {} SET status = $3, last_failed_payment_id = $4, updated_at = NOW() \
             WHERE id = $1 AND external_order_id = $2 \
               AND status NOT IN ('completed', 'refunded') \
               AND last_failed_payment_id IS DISTINCT FROM $4 \
             RETURNING {}",
            kind.table(),
            kind.payable_columns()
        );
        let row = sqlx::query_as::<_, PayableRow>(&sql)
            .bind(cmd.order.id)
            .bind(cmd.external_order_id)
            .bind(cmd.status)
            .bind(cmd.external_payment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_order(kind)))
    }
}

#[derive(Debug, Clone)]
/// Admin "mark unpaid": clear all gateway correlation, move the order to
/// `status` and bump the audit counter by one.
pub struct ResetPayment {
    pub order: OrderRef,
    pub status: OrderStatus,
}

impl Processor<ResetPayment> for DatabaseProcessor {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ResetPayment")]
    async fn process(&self, cmd: ResetPayment) -> Result<Option<PayableOrder>, sqlx::Error> {
        let kind = cmd.order.kind;
        let sql = format!(
            "UPDATE {} \
             SET status = $2, \
                 external_order_id = NULL, \
                 external_payment_id = NULL, \
                 external_signature = NULL, \
                 last_failed_payment_id = NULL, \
                 admin_reset_count = admin_reset_count + 1, \
                 updated_at = NOW() \
             WHERE id = $1 AND status <> 'refunded' \
             RETURNING {}",
            kind.table(),
            kind.payable_columns()
        );
        let row = sqlx::query_as::<_, PayableRow>(&sql)
            .bind(cmd.order.id)
            .bind(cmd.status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_order(kind)))
    }
}

#[derive(Debug, Clone)]
/// Move a `completed` purchase to `refunded`.
pub struct RefundPurchase {
    pub purchase_id: Uuid,
}

impl Processor<RefundPurchase> for DatabaseProcessor {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:RefundPurchase")]
    async fn process(&self, cmd: RefundPurchase) -> Result<Option<PayableOrder>, sqlx::Error> {
        let kind = OrderKind::Purchase;
        let sql = format!(
            "UPDATE purchases SET status = 'refunded', updated_at = NOW() \
             WHERE id = $1 AND status = 'completed' \
             RETURNING {}",
            kind.payable_columns()
        );
        let row = sqlx::query_as::<_, PayableRow>(&sql)
            .bind(cmd.purchase_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_order(kind)))
    }
}
