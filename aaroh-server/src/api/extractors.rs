//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `UserSession` — verifies the `Aaroh-Session` token issued after OTP
//!   login against the email in `Aaroh-Session-Email`.
//! - `AdminAuth` — checks `Aaroh-Admin-Authorization` against the argon2
//!   hash from the config file.
//! - `CsrfGuard` — double-submit check of `X-CSRF-Token` against the
//!   `aaroh_csrf` cookie, required on every mutating admin route.
//! - `WebhookSignature` — the raw `X-Payment-Signature` header, verified
//!   later against the raw body.
//! - `ApiJson`, `ApiPath`, `ApiQuery` — the axum extractors with rejections
//!   turned into [`ApiError`] JSON bodies.
//!
//! All cryptographic operations are delegated to [`aaroh_sdk::signature`].

use aaroh_core::utils::otp::normalize_email;
use aaroh_sdk::signature::{
    self, ADMIN_AUTH_HEADER, CSRF_COOKIE, CSRF_HEADER, SESSION_EMAIL_HEADER, SESSION_HEADER,
    SignatureError, WEBHOOK_SIGNATURE_HEADER,
};
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use std::convert::Infallible;

use super::error::ApiError;
use crate::state::AppState;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

// ---------------------------------------------------------------------------
// UserSession — buyer authentication
// ---------------------------------------------------------------------------

/// A buyer signed in through OTP.
///
/// # Header format
///
/// ```text
/// Aaroh-Session:       {unix_timestamp}.{base64_signature}
/// Aaroh-Session-Email: buyer@example.com
/// ```
///
/// The signature is `HMAC-SHA256("{email}.{timestamp}", session_secret)`
/// and stays valid for [`signature::MAX_SESSION_AGE`] seconds.
#[derive(Debug, Clone)]
pub struct UserSession {
    /// Normalised email the session was issued for.
    pub email: String,
}

impl FromRequestParts<AppState> for UserSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = header_str(&parts.headers, SESSION_HEADER)
            .ok_or(ApiError::Unauthorized("missing session"))?;
        let email = header_str(&parts.headers, SESSION_EMAIL_HEADER)
            .map(normalize_email)
            .filter(|email| !email.is_empty())
            .ok_or(ApiError::Unauthorized("missing session email"))?;

        let (timestamp, signature_bytes) = signature::parse_signature_header(token)
            .map_err(|_| ApiError::Unauthorized("malformed session"))?;

        let session = state.config.session.read().await;
        signature::verify_session(&email, timestamp, &signature_bytes, &session.secret).map_err(
            |e| match e {
                SignatureError::Expired => ApiError::Unauthorized("session expired"),
                _ => ApiError::Unauthorized("invalid session"),
            },
        )?;
        drop(session);

        Ok(UserSession { email })
    }
}

// ---------------------------------------------------------------------------
// AdminAuth — back office authentication
// ---------------------------------------------------------------------------

/// Proof that the request carried the admin secret.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = header_str(&parts.headers, ADMIN_AUTH_HEADER)
            .ok_or(ApiError::Unauthorized("missing admin authorization"))?;

        let admin = state.config.admin.read().await;
        if !admin.verify_secret(provided) {
            drop(admin);
            tracing::warn!("Rejected admin request with a wrong secret");
            return Err(ApiError::Unauthorized("invalid admin authorization"));
        }
        drop(admin);

        Ok(AdminAuth)
    }
}

// ---------------------------------------------------------------------------
// CsrfGuard — double-submit cookie
// ---------------------------------------------------------------------------

/// The `X-CSRF-Token` header matched the `aaroh_csrf` cookie.
pub struct CsrfGuard;

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

impl<S: Send + Sync> FromRequestParts<S> for CsrfGuard {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = header_str(&parts.headers, CSRF_HEADER)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Forbidden("missing CSRF token"))?;
        let cookie = cookie_value(&parts.headers, CSRF_COOKIE)
            .ok_or(ApiError::Forbidden("missing CSRF cookie"))?;
        if token != cookie {
            return Err(ApiError::Forbidden("CSRF token mismatch"));
        }
        Ok(CsrfGuard)
    }
}

// ---------------------------------------------------------------------------
// WebhookSignature
// ---------------------------------------------------------------------------

/// The webhook signature header, if any. Absence is decided by the
/// lifecycle, which rejects unsigned deliveries.
pub struct WebhookSignature(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for WebhookSignature {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(WebhookSignature(
            header_str(&parts.headers, WEBHOOK_SIGNATURE_HEADER).map(str::to_owned),
        ))
    }
}
