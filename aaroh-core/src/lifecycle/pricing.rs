use crate::entities::DeliveryType;
use crate::entities::custom_song_settings::CustomSongSettings;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Smallest amount, in minor units, the gateway accepts.
pub const MIN_GATEWAY_AMOUNT: i64 = 100;

/// Price of a custom song for `delivery_type` under the given settings.
pub fn resolve_price(delivery_type: DeliveryType, settings: &CustomSongSettings) -> Decimal {
    match delivery_type {
        DeliveryType::Standard => settings.standard_price,
        DeliveryType::Express => settings.express_price,
    }
}

/// Convert a major-unit amount into minor units (x100, half away from zero).
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Amount to charge through the gateway, or `None` below the minimum.
pub fn chargeable_minor_units(amount: Decimal) -> Option<i64> {
    to_minor_units(amount).filter(|minor| *minor >= MIN_GATEWAY_AMOUNT)
}
