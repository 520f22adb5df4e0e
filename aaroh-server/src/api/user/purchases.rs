use aaroh_core::entities::payable_order::OrderRef;
use aaroh_core::entities::purchase::{GetPurchaseById, ListPurchasesByEmail};
use aaroh_sdk::objects::{ConfirmPaymentRequest, CreatePurchaseRequest};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use uuid::Uuid;

use super::to_confirmation;
use crate::api::error::ApiError;
use crate::api::extractors::{ApiJson, ApiPath, UserSession};
use crate::state::AppState;

/// `POST /purchases` — returns the buyer's open purchase for the course if
/// one exists.
pub(super) async fn create_purchase(
    state: State<AppState>,
    session: UserSession,
    ApiJson(request): ApiJson<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = state
        .lifecycle()
        .await
        .create_purchase(&session.email, request.course_id)
        .await?;
    Ok((StatusCode::CREATED, Json(purchase.to_response())))
}

pub(super) async fn list_purchases(
    state: State<AppState>,
    session: UserSession,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = state
        .processor()
        .process(ListPurchasesByEmail {
            user_email: session.email,
        })
        .await?;
    let response: Vec<_> = purchases.iter().map(|p| p.to_response()).collect();
    Ok(Json(response))
}

pub(super) async fn get_purchase(
    state: State<AppState>,
    session: UserSession,
    ApiPath(purchase_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = state
        .processor()
        .process(GetPurchaseById { purchase_id })
        .await?
        .filter(|p| p.user_email == session.email)
        .ok_or(ApiError::NotFound)?;
    Ok(Json(purchase.to_response()))
}

pub(super) async fn create_payment_intent(
    state: State<AppState>,
    session: UserSession,
    ApiPath(purchase_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let intent = state
        .lifecycle()
        .await
        .create_payment_intent(OrderRef::purchase(purchase_id), Some(&session.email))
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
            OrderRef::purchase(request.order_id),
            Some(&session.email),
            &request,
        )
        .await?;
    Ok(Json(to_confirmation(&order)))
}
