use super::{OrderStatus, unix_timestamp};
use crate::framework::DatabaseProcessor;
use aaroh_sdk::objects::{AdminPurchaseResponse, PurchaseResponse};
use kanau::processor::Processor;
use uuid::Uuid;

/// A course purchase.
///
/// At most one purchase per (user, course) may be `completed`; the
/// `purchases_one_completed` partial unique index enforces it.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Purchase {
    pub id: Uuid,
    pub user_email: String,
    pub course_id: Uuid,
    pub amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub external_order_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub external_signature: Option<String>,
    pub admin_reset_count: i32,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

impl Purchase {
    pub fn to_response(&self) -> PurchaseResponse {
        PurchaseResponse {
            purchase_id: self.id,
            course_id: self.course_id,
            amount: self.amount,
            status: self.status.into(),
            external_order_id: self.external_order_id.clone(),
            created_at: unix_timestamp(self.created_at),
            updated_at: unix_timestamp(self.updated_at),
        }
    }

    pub fn to_admin_response(&self) -> AdminPurchaseResponse {
        AdminPurchaseResponse {
            purchase_id: self.id,
            user_email: self.user_email.clone(),
            course_id: self.course_id,
            amount: self.amount,
            status: self.status.into(),
            admin_reset_count: self.admin_reset_count,
            external_order_id: self.external_order_id.clone(),
            external_payment_id: self.external_payment_id.clone(),
            created_at: unix_timestamp(self.created_at),
            updated_at: unix_timestamp(self.updated_at),
        }
    }
}

const PURCHASE_COLUMNS: &str = "id, user_email, course_id, amount, status, external_order_id, \
    external_payment_id, external_signature, admin_reset_count, created_at, updated_at";

#[derive(Debug, Clone)]
/// Insert a new `pending` purchase.
pub struct InsertPurchase {
    pub user_email: String,
    pub course_id: Uuid,
    pub amount: rust_decimal::Decimal,
}

impl Processor<InsertPurchase> for DatabaseProcessor {
    type Output = Purchase;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertPurchase")]
    async fn process(&self, insert: InsertPurchase) -> Result<Purchase, sqlx::Error> {
        let sql = format!(
            "INSERT INTO purchases (id, user_email, course_id, amount, status) \
             VALUES ($1, $2, $3, $4, 'pending') \
             RETURNING {PURCHASE_COLUMNS}"
        );
        sqlx::query_as::<_, Purchase>(&sql)
            .bind(Uuid::now_v7())
            .bind(insert.user_email)
            .bind(insert.course_id)
            .bind(insert.amount)
            .fetch_one(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct GetPurchaseById {
    pub purchase_id: Uuid,
}

impl Processor<GetPurchaseById> for DatabaseProcessor {
    type Output = Option<Purchase>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPurchaseById")]
    async fn process(&self, query: GetPurchaseById) -> Result<Option<Purchase>, sqlx::Error> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1");
        sqlx::query_as::<_, Purchase>(&sql)
            .bind(query.purchase_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Find the newest purchase of a course by a user, in any status.
///
/// Used at checkout to detect an existing completed purchase or to reuse
/// an unfinished one.
pub struct FindLatestPurchase {
    pub user_email: String,
    pub course_id: Uuid,
}

impl Processor<FindLatestPurchase> for DatabaseProcessor {
    type Output = Option<Purchase>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindLatestPurchase")]
    async fn process(&self, query: FindLatestPurchase) -> Result<Option<Purchase>, sqlx::Error> {
        // A completed purchase sorts first so re-entry never hides it.
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE user_email = $1 AND course_id = $2 \
             ORDER BY (status = 'completed') DESC, created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Purchase>(&sql)
            .bind(query.user_email)
            .bind(query.course_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// List purchases made by a user, newest first.
pub struct ListPurchasesByEmail {
    pub user_email: String,
}

impl Processor<ListPurchasesByEmail> for DatabaseProcessor {
    type Output = Vec<Purchase>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPurchasesByEmail")]
    async fn process(&self, query: ListPurchasesByEmail) -> Result<Vec<Purchase>, sqlx::Error> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE user_email = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Purchase>(&sql)
            .bind(query.user_email)
            .fetch_all(&self.pool)
            .await
    }
}
