//! Unauthenticated endpoints: catalogue, pricing, tracking and OTP login.

use aaroh_core::entities::course::{GetCourseById, ListPublishedCourses};
use aaroh_core::entities::custom_song_settings::GetCustomSongSettings;
use aaroh_core::events::{NotificationEvent, emit};
use aaroh_core::lifecycle::validate_email;
use aaroh_core::utils::classify_tracking_id;
use aaroh_sdk::objects::{
    OtpRequest, OtpSentResponse, OtpVerifyRequest, SessionResponse, TrackingResponse,
};
use aaroh_sdk::signature::{self, MAX_SESSION_AGE};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use uuid::Uuid;

use super::error::ApiError;
use super::extractors::{ApiJson, ApiPath};
use crate::state::AppState;

/// `GET /api/courses`
pub(super) async fn list_courses(
    state: State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let courses = state.processor().process(ListPublishedCourses).await?;
    let response: Vec<_> = courses.iter().map(|c| c.to_response()).collect();
    Ok(Json(response))
}

/// `GET /api/courses/{id}` — unpublished courses are invisible.
pub(super) async fn get_course(
    state: State<AppState>,
    ApiPath(course_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let course = state
        .processor()
        .process(GetCourseById { course_id })
        .await?
        .filter(|course| course.is_published)
        .ok_or(ApiError::NotFound)?;
    Ok(Json(course.to_response()))
}

/// `GET /api/custom-songs/pricing`
pub(super) async fn custom_song_pricing(
    state: State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state.processor().process(GetCustomSongSettings).await?;
    Ok(Json(settings.to_pricing()))
}

/// `GET /api/tracking/{id}`
pub(super) async fn track_shipment(
    ApiPath(tracking_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tracking_id = tracking_id.trim().to_ascii_uppercase();
    if tracking_id.is_empty() {
        return Err(ApiError::Validation("tracking id is required".into()));
    }
    let courier = classify_tracking_id(&tracking_id);
    Ok(Json(TrackingResponse {
        courier: courier.name().to_string(),
        tracking_url: courier.tracking_url(&tracking_id),
        tracking_id,
    }))
}

/// `POST /api/auth/otp` — email a fresh login code.
pub(super) async fn request_otp(
    state: State<AppState>,
    ApiJson(request): ApiJson<OtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_email(&request.email)?;
    let code = state.otp.issue(&email).await;
    tracing::info!(email = %email, "Login code issued");
    emit(
        &state.notifications,
        NotificationEvent::OtpRequested {
            email: email.clone(),
            code,
        },
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(OtpSentResponse {
            email,
            expires_in: state.otp.ttl().as_secs(),
        }),
    ))
}

/// `POST /api/auth/otp/verify` — trade a valid code for a session token.
pub(super) async fn verify_otp(
    state: State<AppState>,
    ApiJson(request): ApiJson<OtpVerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_email(&request.email)?;
    if !state.otp.verify(&email, &request.code).await {
        tracing::info!(email = %email, "Login code rejected");
        return Err(ApiError::Unauthorized("invalid or expired code"));
    }

    let session = state.config.session.read().await;
    let session_token = signature::sign_session(&email, &session.secret);
    drop(session);

    let expires_at = time::OffsetDateTime::now_utc().unix_timestamp() + MAX_SESSION_AGE;
    Ok(Json(SessionResponse {
        email,
        session_token,
        expires_at,
    }))
}
