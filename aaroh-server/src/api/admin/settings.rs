use aaroh_core::entities::custom_song_settings::GetCustomSongSettings;
use aaroh_sdk::objects::UpdatePricingRequest;
use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;

use crate::api::error::ApiError;
use crate::api::extractors::{AdminAuth, ApiJson, CsrfGuard};
use crate::state::AppState;

pub(super) async fn get_pricing(
    state: State<AppState>,
    _auth: AdminAuth,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state.processor().process(GetCustomSongSettings).await?;
    Ok(Json(settings.to_pricing()))
}

/// `PUT /settings/custom-song` — applies to orders created afterwards only.
pub(super) async fn update_pricing(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiJson(request): ApiJson<UpdatePricingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state
        .lifecycle()
        .await
        .update_pricing(request.standard_price, request.express_price)
        .await?;
    Ok(Json(settings.to_pricing()))
}
