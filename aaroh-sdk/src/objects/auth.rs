//! Email OTP login types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub code: String,
}

/// Acknowledges that a login code was sent. The code itself only travels
/// by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpSentResponse {
    pub email: String,
    /// Seconds until the code expires.
    pub expires_in: u64,
}

/// Session issued after a successful OTP check.
///
/// Clients send `session_token` in `Aaroh-Session` and `email` in
/// `Aaroh-Session-Email` on every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub email: String,
    pub session_token: String,
    pub expires_at: i64,
}
