use crate::framework::DatabaseProcessor;
use aaroh_sdk::objects::CustomSongPricing;
use kanau::processor::Processor;
use rust_decimal::Decimal;

/// Singleton price settings for custom songs (row id 1).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CustomSongSettings {
    pub standard_price: Decimal,
    pub express_price: Decimal,
    pub updated_at: time::PrimitiveDateTime,
}

impl CustomSongSettings {
    pub fn to_pricing(&self) -> CustomSongPricing {
        CustomSongPricing {
            standard_price: self.standard_price,
            express_price: self.express_price,
        }
    }
}

#[derive(Debug, Clone)]
/// Read the current price settings.
pub struct GetCustomSongSettings;

impl Processor<GetCustomSongSettings> for DatabaseProcessor {
    type Output = CustomSongSettings;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCustomSongSettings")]
    async fn process(&self, _query: GetCustomSongSettings) -> Result<CustomSongSettings, sqlx::Error> {
        sqlx::query_as::<_, CustomSongSettings>(
            r#"
            SELECT standard_price, express_price, updated_at
            FROM custom_song_settings
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Replace the price settings. Existing orders are untouched.
pub struct UpdateCustomSongSettings {
    pub standard_price: Decimal,
    pub express_price: Decimal,
}

impl Processor<UpdateCustomSongSettings> for DatabaseProcessor {
    type Output = CustomSongSettings;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateCustomSongSettings")]
    async fn process(
        &self,
        cmd: UpdateCustomSongSettings,
    ) -> Result<CustomSongSettings, sqlx::Error> {
        sqlx::query_as::<_, CustomSongSettings>(
            r#"
            INSERT INTO custom_song_settings (id, standard_price, express_price)
            VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE
            SET standard_price = EXCLUDED.standard_price,
                express_price = EXCLUDED.express_price,
                updated_at = NOW()
            RETURNING standard_price, express_price, updated_at
            "#,
        )
        .bind(cmd.standard_price)
        .bind(cmd.express_price)
        .fetch_one(&self.pool)
        .await
    }
}
