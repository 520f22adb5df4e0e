//! Admin API handlers.
//!
//! These endpoints are called by the back office and require the
//! `Aaroh-Admin-Authorization` header with the plaintext admin secret.
//! Mutating endpoints also require the `X-CSRF-Token` double-submit check.
//!
//! # Endpoints
//!
//! - `GET   /custom-songs`                – list orders (paginated, filterable)
//! - `GET   /custom-songs/{id}`           – order detail
//! - `POST  /custom-songs/{id}/preview`   – attach preview, order becomes payable
//! - `POST  /custom-songs/{id}/full-audio`– attach the full track
//! - `PATCH /custom-songs/{id}/status`    – in_progress / failed
//! - `PATCH /custom-songs/{id}/approval`  – approve or revoke
//! - `PATCH /custom-songs/{id}/payment`   – force paid / reset to unpaid
//! - `PATCH /purchases/{id}/payment`      – force paid / reset to unpaid
//! - `POST  /purchases/{id}/refund`       – refund a completed purchase
//! - `GET   /settings/custom-song`        – current prices
//! - `PUT   /settings/custom-song`        – update prices

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

mod custom_songs;
mod purchases;
mod settings;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/custom-songs", get(custom_songs::list_custom_songs))
        .route("/custom-songs/{id}", get(custom_songs::get_custom_song))
        .route(
            "/custom-songs/{id}/preview",
            post(custom_songs::set_preview),
        )
        .route(
            "/custom-songs/{id}/full-audio",
            post(custom_songs::set_full_audio),
        )
        .route(
            "/custom-songs/{id}/status",
            patch(custom_songs::update_status),
        )
        .route(
            "/custom-songs/{id}/approval",
            patch(custom_songs::set_approval),
        )
        .route(
            "/custom-songs/{id}/payment",
            patch(custom_songs::set_payment_status),
        )
        .route(
            "/purchases/{id}/payment",
            patch(purchases::set_payment_status),
        )
        .route("/purchases/{id}/refund", post(purchases::refund))
        .route(
            "/settings/custom-song",
            get(settings::get_pricing).put(settings::update_pricing),
        )
}
