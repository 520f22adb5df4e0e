use aaroh_core::entities::custom_song_order::{GetCustomSongOrderById, ListCustomSongOrders};
use aaroh_core::entities::payable_order::OrderRef;
use aaroh_sdk::objects::{
    ApprovalRequest, ListCustomSongsQuery, SetFullAudioRequest, SetPaymentStatusRequest,
    SetPreviewRequest, UpdateSongStatusRequest, clamp_pagination,
};
use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::extractors::{AdminAuth, ApiJson, ApiPath, ApiQuery, CsrfGuard};
use crate::state::AppState;

/// `GET /custom-songs` — newest first.
pub(super) async fn list_custom_songs(
    state: State<AppState>,
    _auth: AdminAuth,
    ApiQuery(query): ApiQuery<ListCustomSongsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let orders = state
        .processor()
        .process(ListCustomSongOrders {
            limit,
            offset,
            status: query.status.map(Into::into),
        })
        .await?;

    let response: Vec<_> = orders.iter().map(|o| o.to_admin_response()).collect();
    Ok(Json(response))
}

pub(super) async fn get_custom_song(
    state: State<AppState>,
    _auth: AdminAuth,
    ApiPath(order_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .processor()
        .process(GetCustomSongOrderById { order_id })
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(order.to_admin_response()))
}

pub(super) async fn set_preview(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetPreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle()
        .await
        .set_preview(order_id, &request.preview_url, request.poster_url.as_deref())
        .await?;
    Ok(Json(order.to_admin_response()))
}

pub(super) async fn set_full_audio(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetFullAudioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle()
        .await
        .set_full_audio(order_id, &request.full_audio_url)
        .await?;
    Ok(Json(order.to_admin_response()))
}

pub(super) async fn update_status(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateSongStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle()
        .await
        .set_production_status(order_id, request.status)
        .await?;
    Ok(Json(order.to_admin_response()))
}

pub(super) async fn set_approval(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle()
        .await
        .set_approval(order_id, request.is_approved)
        .await?;
    Ok(Json(order.to_admin_response()))
}

/// `PATCH /custom-songs/{id}/payment` — `{"status": "paid" | "unpaid"}`.
pub(super) async fn set_payment_status(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetPaymentStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .lifecycle()
        .await
        .admin_set_payment(OrderRef::custom_song(order_id), request.status)
        .await?;

    let order = state
        .processor()
        .process(GetCustomSongOrderById { order_id })
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(order.to_admin_response()))
}
