use super::{DeliveryType, OrderStatus, unix_timestamp};
use crate::framework::DatabaseProcessor;
use aaroh_sdk::objects::{AdminCustomSongResponse, CustomSongOrderResponse};
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CustomSongOrder {
    pub id: Uuid,
    pub user_email: String,
    pub occasion: String,
    pub recipient_name: String,
    pub story: String,
    pub mood: String,
    pub style: String,
    pub language: String,
    pub length: String,
    pub delivery_type: DeliveryType,
    /// Frozen from the price settings at creation time.
    pub amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub preview_url: Option<String>,
    pub full_audio_url: Option<String>,
    pub poster_url: Option<String>,
    pub is_approved: bool,
    pub admin_reset_count: i32,
    pub external_order_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub external_signature: Option<String>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

impl CustomSongOrder {
    /// The full track, only once the order is paid.
    pub fn deliverable_audio_url(&self) -> Option<&str> {
        match self.status {
            OrderStatus::Completed => self.full_audio_url.as_deref(),
            _ => None,
        }
    }

    /// Buyer-facing view. The full track stays hidden until completion.
    pub fn to_response(&self) -> CustomSongOrderResponse {
        CustomSongOrderResponse {
            order_id: self.id,
            occasion: self.occasion.clone(),
            recipient_name: self.recipient_name.clone(),
            mood: self.mood.clone(),
            style: self.style.clone(),
            language: self.language.clone(),
            length: self.length.clone(),
            delivery_type: self.delivery_type.into(),
            amount: self.amount,
            status: self.status.into(),
            preview_url: self.preview_url.clone(),
            poster_url: self.poster_url.clone(),
            full_audio_url: self.deliverable_audio_url().map(str::to_owned),
            created_at: unix_timestamp(self.created_at),
        }
    }

    pub fn to_admin_response(&self) -> AdminCustomSongResponse {
        AdminCustomSongResponse {
            order_id: self.id,
            user_email: self.user_email.clone(),
            occasion: self.occasion.clone(),
            recipient_name: self.recipient_name.clone(),
            story: self.story.clone(),
            mood: self.mood.clone(),
            style: self.style.clone(),
            language: self.language.clone(),
            length: self.length.clone(),
            delivery_type: self.delivery_type.into(),
            amount: self.amount,
            status: self.status.into(),
            preview_url: self.preview_url.clone(),
            full_audio_url: self.full_audio_url.clone(),
            poster_url: self.poster_url.clone(),
            is_approved: self.is_approved,
            admin_reset_count: self.admin_reset_count,
            external_order_id: self.external_order_id.clone(),
            external_payment_id: self.external_payment_id.clone(),
            created_at: unix_timestamp(self.created_at),
            updated_at: unix_timestamp(self.updated_at),
        }
    }
}

const SONG_COLUMNS: &str = "id, user_email, occasion, recipient_name, story, mood, style, \
    language, length, delivery_type, amount, status, preview_url, full_audio_url, poster_url, \
    is_approved, admin_reset_count, external_order_id, external_payment_id, external_signature, \
    created_at, updated_at";

#[derive(Debug, Clone)]
/// Insert a new `pending` custom song order with an already resolved amount.
pub struct InsertCustomSongOrder {
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
}

impl Processor<InsertCustomSongOrder> for DatabaseProcessor {
    type Output = CustomSongOrder;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertCustomSongOrder")]
    async fn process(&self, insert: InsertCustomSongOrder) -> Result<CustomSongOrder, sqlx::Error> {
        let sql = format!(
            "INSERT INTO custom_song_orders \
             (id, user_email, occasion, recipient_name, story, mood, style, language, length, \
              delivery_type, amount, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending') \
             RETURNING {SONG_COLUMNS}"
        );
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(Uuid::now_v7())
            .bind(insert.user_email)
            .bind(insert.occasion)
            .bind(insert.recipient_name)
            .bind(insert.story)
            .bind(insert.mood)
            .bind(insert.style)
            .bind(insert.language)
            .bind(insert.length)
            .bind(insert.delivery_type)
            .bind(insert.amount)
            .fetch_one(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct GetCustomSongOrderById {
    pub order_id: Uuid,
}

impl Processor<GetCustomSongOrderById> for DatabaseProcessor {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCustomSongOrderById")]
    async fn process(
        &self,
        query: GetCustomSongOrderById,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        let sql = format!("SELECT {SONG_COLUMNS} FROM custom_song_orders WHERE id = $1");
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(query.order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// List a buyer's custom song orders, newest first.
pub struct ListCustomSongOrdersByEmail {
    pub user_email: String,
}

impl Processor<ListCustomSongOrdersByEmail> for DatabaseProcessor {
    type Output = Vec<CustomSongOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListCustomSongOrdersByEmail")]
    async fn process(
        &self,
        query: ListCustomSongOrdersByEmail,
    ) -> Result<Vec<CustomSongOrder>, sqlx::Error> {
        let sql = format!(
            "SELECT {SONG_COLUMNS} FROM custom_song_orders \
             WHERE user_email = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(query.user_email)
            .fetch_all(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Paginated listing for the back office, optionally filtered by status.
pub struct ListCustomSongOrders {
    pub limit: i64,
    pub offset: i64,
    pub status: Option<OrderStatus>,
}

impl Processor<ListCustomSongOrders> for DatabaseProcessor {
    type Output = Vec<CustomSongOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListCustomSongOrders")]
    async fn process(
        &self,
        query: ListCustomSongOrders,
    ) -> Result<Vec<CustomSongOrder>, sqlx::Error> {
        let sql = format!(
            "SELECT {SONG_COLUMNS} FROM custom_song_orders \
             WHERE ($1::order_status IS NULL OR status = $1) \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(query.status)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Attach a preview and flip the order to `ready`.
///
/// Guarded on the order still being in production (`pending`,
/// `in_progress`) or already `ready`; returns `None` otherwise.
pub struct SetCustomSongPreview {
    pub order_id: Uuid,
    pub preview_url: String,
    pub poster_url: Option<String>,
}

impl Processor<SetCustomSongPreview> for DatabaseProcessor {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetCustomSongPreview")]
    async fn process(
        &self,
        cmd: SetCustomSongPreview,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        let sql = format!(
            "UPDATE custom_song_orders \
             SET preview_url = $2, poster_url = COALESCE($3, poster_url), \
                 status = 'ready', updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'in_progress', 'ready') \
             RETURNING {SONG_COLUMNS}"
        );
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(cmd.order_id)
            .bind(cmd.preview_url)
            .bind(cmd.poster_url)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Store the full track. Refused (returns `None`) for failed orders.
pub struct SetCustomSongFullAudio {
    pub order_id: Uuid,
    pub full_audio_url: String,
}

impl Processor<SetCustomSongFullAudio> for DatabaseProcessor {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetCustomSongFullAudio")]
    async fn process(
        &self,
        cmd: SetCustomSongFullAudio,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        let sql = format!(
            "UPDATE custom_song_orders \
             SET full_audio_url = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> 'failed' \
             RETURNING {SONG_COLUMNS}"
        );
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(cmd.order_id)
            .bind(cmd.full_audio_url)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Move an order that has no preview yet to `in_progress` or `failed`.
pub struct SetCustomSongProductionStatus {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

impl Processor<SetCustomSongProductionStatus> for DatabaseProcessor {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetCustomSongProductionStatus")]
    async fn process(
        &self,
        cmd: SetCustomSongProductionStatus,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        let sql = format!(
            "UPDATE custom_song_orders \
             SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'in_progress') \
             RETURNING {SONG_COLUMNS}"
        );
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(cmd.order_id)
            .bind(cmd.status)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct SetCustomSongApproval {
    pub order_id: Uuid,
    pub is_approved: bool,
}

impl Processor<SetCustomSongApproval> for DatabaseProcessor {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetCustomSongApproval")]
    async fn process(
        &self,
        cmd: SetCustomSongApproval,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        let sql = format!(
            "UPDATE custom_song_orders \
             SET is_approved = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {SONG_COLUMNS}"
        );
        sqlx::query_as::<_, CustomSongOrder>(&sql)
            .bind(cmd.order_id)
            .bind(cmd.is_approved)
            .fetch_optional(&self.pool)
            .await
    }
}
