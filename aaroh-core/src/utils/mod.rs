pub mod otp;
pub mod tracking;
pub mod ttl_cache;

pub use otp::{OTP_TTL, OtpStore};
pub use tracking::{Courier, classify_tracking_id};
pub use ttl_cache::{Take, TtlCache};
