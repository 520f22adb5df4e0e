//! Outbound HTTP clients.
//!
//! Both clients read their credentials from the shared configuration on
//! every call, so a SIGHUP reload takes effect without rebuilding them.

pub mod gateway;
pub mod mailer;

pub use gateway::{CreateGatewayOrder, GatewayClient, GatewayError, GatewayOrder};
pub use mailer::{EmailMessage, MailError, Mailer, SendEmail};

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
