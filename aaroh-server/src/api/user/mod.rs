//! Buyer API handlers.
//!
//! Every endpoint here requires a session from the OTP login
//! ([`UserSession`](crate::api::extractors::UserSession)). Orders belonging
//! to another buyer are reported as missing.
//!
//! # Endpoints
//!
//! - `POST /purchases`                  – start (or resume) a course checkout
//! - `GET  /purchases`                  – list own purchases
//! - `GET  /purchases/{id}`             – purchase detail
//! - `POST /purchases/{id}/payment`     – create payment intent
//! - `POST /purchases/confirm`          – confirm a checkout payment
//! - `POST /custom-songs`               – order a custom song
//! - `GET  /custom-songs`               – list own custom songs
//! - `GET  /custom-songs/{id}`          – custom song detail
//! - `POST /custom-songs/{id}/payment`  – create payment intent
//! - `POST /custom-songs/confirm`       – confirm a checkout payment

use aaroh_core::entities::payable_order::PayableOrder;
use aaroh_sdk::objects::PaymentConfirmation;
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod custom_songs;
mod purchases;

/// Build the buyer API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/purchases",
            post(purchases::create_purchase).get(purchases::list_purchases),
        )
        .route("/purchases/confirm", post(purchases::confirm_payment))
        .route("/purchases/{id}", get(purchases::get_purchase))
        .route(
            "/purchases/{id}/payment",
            post(purchases::create_payment_intent),
        )
        .route(
            "/custom-songs",
            post(custom_songs::create_custom_song).get(custom_songs::list_custom_songs),
        )
        .route("/custom-songs/confirm", post(custom_songs::confirm_payment))
        .route("/custom-songs/{id}", get(custom_songs::get_custom_song))
        .route(
            "/custom-songs/{id}/payment",
            post(custom_songs::create_payment_intent),
        )
}

fn to_confirmation(order: &PayableOrder) -> PaymentConfirmation {
    PaymentConfirmation {
        order_id: order.id,
        status: order.status.into(),
        external_payment_id: order.external_payment_id.clone(),
    }
}
