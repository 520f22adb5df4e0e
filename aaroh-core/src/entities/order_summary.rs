use super::payable_order::{OrderKind, OrderRef};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// What a notification needs to know about an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order: OrderRef,
    pub user_email: String,
    pub amount: rust_decimal::Decimal,
    /// Course title, or a short description of the custom song.
    pub title: String,
    pub preview_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    user_email: String,
    amount: rust_decimal::Decimal,
    title: String,
    preview_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GetOrderSummary {
    pub order: OrderRef,
}

impl Processor<GetOrderSummary> for DatabaseProcessor {
    type Output = Option<OrderSummary>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderSummary")]
    async fn process(&self, query: GetOrderSummary) -> Result<Option<OrderSummary>, sqlx::Error> {
        let sql = match query.order.kind {
            OrderKind::Purchase => {
                r#"
                SELECT p.user_email, p.amount, c.title, NULL::text AS preview_url
                FROM purchases p
                JOIN courses c ON c.id = p.course_id
                WHERE p.id = $1
                "#
            }
            OrderKind::CustomSong => {
                r#"
                SELECT user_email, amount,
                       'Custom ' || occasion || ' song for ' || recipient_name AS title,
                       preview_url
                FROM custom_song_orders
                WHERE id = $1
                "#
            }
        };
        let row = sqlx::query_as::<_, SummaryRow>(sql)
            .bind(query.order.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| OrderSummary {
            order: query.order,
            user_email: r.user_email,
            amount: r.amount,
            title: r.title,
            preview_url: r.preview_url,
        }))
    }
}
