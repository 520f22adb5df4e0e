//! HTTP API.
//!
//! - `/api/...` – catalogue, OTP login, buyer checkout and the gateway webhook
//! - `/admin/...` – back office, see [`admin`]

pub mod admin;
pub mod error;
pub mod extractors;
mod public;
pub mod user;
mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(public::list_courses))
        .route("/courses/{id}", get(public::get_course))
        .route("/custom-songs/pricing", get(public::custom_song_pricing))
        .route("/tracking/{id}", get(public::track_shipment))
        .route("/auth/otp", post(public::request_otp))
        .route("/auth/otp/verify", post(public::verify_otp))
        .route("/webhooks/payment", post(webhook::payment_webhook))
        .merge(user::router())
}
