//! Signature algorithms and verification for the Aaroh APIs.
//!
//! All schemes are HMAC-SHA256 computed with [`ring::hmac`], so every
//! comparison is constant time.
//!
//! * **Payment confirmation** (client checkout callback):
//!   `hex(HMAC-SHA256("{external_order_id}|{external_payment_id}", gateway_key_secret))`
//!
//! * **Gateway webhook**:
//!   `hex(HMAC-SHA256(raw_body, webhook_secret))`, carried in
//!   [`WEBHOOK_SIGNATURE_HEADER`]. The webhook secret is distinct from the
//!   gateway key secret.
//!
//! * **Session token** (issued after OTP login):
//!   `HMAC-SHA256("{email}.{timestamp}", session_secret)`, formatted as
//!   `{unix_timestamp}.{base64_signature}` in [`SESSION_HEADER`].

/// Header carrying the gateway's webhook signature.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Payment-Signature";

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "Aaroh-Session";

/// Header carrying the email the session token was issued for.
pub const SESSION_EMAIL_HEADER: &str = "Aaroh-Session-Email";

/// Header for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Aaroh-Admin-Authorization";

/// Header carrying the CSRF token for state-changing admin requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Cookie the CSRF header is compared against.
pub const CSRF_COOKIE: &str = "aaroh_csrf";

/// Maximum allowed age of a session token (in seconds).
pub const MAX_SESSION_AGE: i64 = 7 * 24 * 60 * 60;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> ring::hmac::Tag {
    ring::hmac::sign(&ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key), data)
}

fn verify_hmac_sha256(key: &[u8], data: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data,
        signature,
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Payment confirmation
// ---------------------------------------------------------------------------

/// Sign a gateway order/payment pair, returning the lowercase hex digest.
///
/// This is what the gateway hands to the checkout client after a
/// successful payment.
pub fn sign_payment(external_order_id: &str, external_payment_id: &str, key: &[u8]) -> String {
    let data = format!("{external_order_id}|{external_payment_id}");
    hex::encode(hmac_sha256(key, data.as_bytes()).as_ref())
}

/// Verify the hex signature the checkout client received from the gateway.
pub fn verify_payment(
    external_order_id: &str,
    external_payment_id: &str,
    signature_hex: &str,
    key: &[u8],
) -> Result<(), SignatureError> {
    let signature = hex::decode(signature_hex.trim()).map_err(|_| SignatureError::InvalidHex)?;
    let data = format!("{external_order_id}|{external_payment_id}");
    verify_hmac_sha256(key, data.as_bytes(), &signature)
}

// ---------------------------------------------------------------------------
// Webhook body signing
// ---------------------------------------------------------------------------

/// Sign a raw webhook body, returning the lowercase hex digest.
pub fn sign_webhook_body(body: &[u8], key: &[u8]) -> String {
    hex::encode(hmac_sha256(key, body).as_ref())
}

/// Verify a webhook signature header against the raw request body.
///
/// Must be called before the body is parsed.
pub fn verify_webhook_body(body: &[u8], signature_hex: &str, key: &[u8]) -> Result<(), SignatureError> {
    let signature = hex::decode(signature_hex.trim()).map_err(|_| SignatureError::InvalidHex)?;
    verify_hmac_sha256(key, body, &signature)
}

// ---------------------------------------------------------------------------
// Header parsing / formatting
// ---------------------------------------------------------------------------

/// Parse a `{timestamp}.{base64}` header value into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, signature) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp.parse().map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(signature)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Check that a signature timestamp is no older than `max_age` seconds.
pub fn check_timestamp(timestamp: i64, max_age: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > max_age {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Session tokens
// ---------------------------------------------------------------------------

/// Issue a session token for `email`: `HMAC-SHA256("{email}.{timestamp}", key)`.
///
/// Returns the formatted [`SESSION_HEADER`] value.
pub fn sign_session(email: &str, key: &[u8]) -> String {
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
    sign_session_at(email, timestamp, key)
}

fn sign_session_at(email: &str, timestamp: i64, key: &[u8]) -> String {
    let data = format!("{email}.{timestamp}");
    format_signature_header(timestamp, hmac_sha256(key, data.as_bytes()).as_ref())
}

/// Verify a session token issued by [`sign_session`].
pub fn verify_session(
    email: &str,
    timestamp: i64,
    signature: &[u8],
    key: &[u8],
) -> Result<(), SignatureError> {
    let data = format!("{email}.{timestamp}");
    verify_hmac_sha256(key, data.as_bytes(), signature)?;
    check_timestamp(timestamp, MAX_SESSION_AGE)
}
