use aaroh_core::entities::payable_order::OrderRef;
use aaroh_core::entities::purchase::GetPurchaseById;
use aaroh_sdk::objects::{AdminPurchaseResponse, SetPaymentStatusRequest};
use axum::{Json, extract::State};
use kanau::processor::Processor;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::extractors::{AdminAuth, ApiJson, ApiPath, CsrfGuard};
use crate::state::AppState;

async fn admin_view(
    state: &AppState,
    purchase_id: Uuid,
) -> Result<Json<AdminPurchaseResponse>, ApiError> {
    let purchase = state
        .processor()
        .process(GetPurchaseById { purchase_id })
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(purchase.to_admin_response()))
}

/// `PATCH /purchases/{id}/payment` — `{"status": "paid" | "unpaid"}`.
pub(super) async fn set_payment_status(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiPath(purchase_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetPaymentStatusRequest>,
) -> Result<Json<AdminPurchaseResponse>, ApiError> {
    state
        .lifecycle()
        .await
        .admin_set_payment(OrderRef::purchase(purchase_id), request.status)
        .await?;
    admin_view(&state, purchase_id).await
}

/// `POST /purchases/{id}/refund` — only completed purchases can be refunded.
pub(super) async fn refund(
    state: State<AppState>,
    _auth: AdminAuth,
    _csrf: CsrfGuard,
    ApiPath(purchase_id): ApiPath<Uuid>,
) -> Result<Json<AdminPurchaseResponse>, ApiError> {
    state.lifecycle().await.refund_purchase(purchase_id).await?;
    admin_view(&state, purchase_id).await
}
