//! Outgoing email configuration.

/// Transactional email API settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// HTTP endpoint messages are posted to.
    pub api_url: String,
    pub api_key: String,
    /// Sender address.
    pub from: String,
    /// Where admin alerts go.
    pub admin_address: String,
}
