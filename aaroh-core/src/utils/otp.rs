//! One-time login codes sent by email.

use super::ttl_cache::{Take, TtlCache};
use rand::Rng;
use std::time::Duration;

/// How long an issued code stays valid.
pub const OTP_TTL: Duration = Duration::from_secs(10 * 60);

/// Wrong guesses allowed against one issued code before it is discarded.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
struct IssuedCode {
    code: String,
    failed_attempts: u32,
}

/// Issues and checks 6-digit codes, keyed by normalized email.
///
/// Each code tolerates [`MAX_OTP_ATTEMPTS`] wrong guesses; the next wrong
/// guess discards it and the user has to request a new one.
#[derive(Debug)]
pub struct OtpStore {
    codes: TtlCache<String, IssuedCode>,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpStore {
    pub fn new() -> Self {
        Self::with_ttl(OTP_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            codes: TtlCache::new(ttl),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.codes.ttl()
    }

    /// Issue a fresh code for `email`, replacing any earlier one.
    pub async fn issue(&self, email: &str) -> String {
        let code = generate_code();
        let issued = IssuedCode {
            code: code.clone(),
            failed_attempts: 0,
        };
        self.codes.put(normalize_email(email), issued).await;
        code
    }

    /// Check `code` for `email`. A matching code is consumed; a wrong one
    /// counts against the attempt limit.
    pub async fn verify(&self, email: &str, code: &str) -> bool {
        let code = code.trim();
        self.codes
            .take_with(&normalize_email(email), |issued| {
                if issued.code == code {
                    return Take::Consume;
                }
                issued.failed_attempts += 1;
                if issued.failed_attempts >= MAX_OTP_ATTEMPTS {
                    Take::Evict
                } else {
                    Take::Keep
                }
            })
            .await
            .is_some()
    }

    pub async fn purge_expired(&self) -> usize {
        self.codes.purge_expired().await
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}
