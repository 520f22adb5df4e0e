use aaroh_core::entities::custom_song_order::{
    GetCustomSongOrderById, ListCustomSongOrdersByEmail,
};
use aaroh_core::entities::payable_order::OrderRef;
use aaroh_sdk::objects::{ConfirmPaymentRequest, CreateCustomSongOrder};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use uuid::Uuid;

use super::to_confirmation;
use crate::api::error::ApiError;
use crate::api::extractors::{ApiJson, ApiPath, UserSession};
use crate::state::AppState;

/// `POST /custom-songs` — priced from the current settings and frozen.
pub(super) async fn create_custom_song(
    state: State<AppState>,
    session: UserSession,
    ApiJson(request): ApiJson<CreateCustomSongOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle()
        .await
        .create_custom_song_order(&session.email, request)
        .await?;
    Ok((StatusCode::CREATED, Json(order.to_response())))
}

pub(super) async fn list_custom_songs(
    state: State<AppState>,
    session: UserSession,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .processor()
        .process(ListCustomSongOrdersByEmail {
            user_email: session.email,
        })
        .await?;
    let response: Vec<_> = orders.iter().map(|o| o.to_response()).collect();
    Ok(Json(response))
}

/// `GET /custom-songs/{id}` — the full track URL is only present once paid.
pub(super) async fn get_custom_song(
    state: State<AppState>,
    session: UserSession,
    ApiPath(order_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .processor()
        .process(GetCustomSongOrderById { order_id })
        .await?
        .filter(|o| o.user_email == session.email)
        .ok_or(ApiError::NotFound)?;
    Ok(Json(order.to_response()))
}

pub(super) async fn create_payment_intent(
    state: State<AppState>,
    session: UserSession,
    ApiPath(order_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let intent = state
        .lifecycle()
        .await
        .create_payment_intent(OrderRef::custom_song(order_id), Some(&session.email))
        .await?;
    Ok(Json(intent))
}

pub(super) async fn confirm_payment(
    state: State<AppState>,
    session: UserSession,
    ApiJson(request): ApiJson<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle()
        .await
        .confirm_payment(
            OrderRef::custom_song(request.order_id),
            Some(&session.email),
            &request,
        )
        .await?;
    Ok(Json(to_confirmation(&order)))
}
