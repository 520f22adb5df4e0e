//! Payment gateway and session signing configuration.

use compact_str::CompactString;

/// Payment gateway credentials.
///
/// `key_secret` signs the per-payment confirmation handed to the checkout
/// client; `webhook_secret` signs server-to-server notifications. They are
/// never interchangeable.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public key id, also given to the checkout client.
    pub key_id: String,
    pub key_secret: Box<[u8]>,
    pub webhook_secret: Box<[u8]>,
    /// Base URL of the gateway REST API.
    pub api_base: String,
    /// ISO currency code orders are created in.
    pub currency: CompactString,
}

/// Secret used to sign session tokens issued after OTP login.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: Box<[u8]>,
}
