//! Transactional email client.

use crate::config::EmailConfig;
use kanau::processor::Processor;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mail provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SendEmail(pub EmailMessage);

#[derive(Serialize)]
struct MailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    config: Arc<RwLock<EmailConfig>>,
    http: reqwest::Client,
}

impl Mailer {
    pub fn new(config: Arc<RwLock<EmailConfig>>) -> Self {
        Self {
            config,
            http: super::http_client(),
        }
    }
}

impl Processor<SendEmail> for Mailer {
    type Output = ();
    type Error = MailError;
    #[tracing::instrument(skip_all, err, name = "HTTP:SendEmail")]
    async fn process(&self, SendEmail(message): SendEmail) -> Result<(), MailError> {
        let (api_url, api_key, from) = {
            let config = self.config.read().await;
            (
                config.api_url.clone(),
                config.api_key.clone(),
                config.from.clone(),
            )
        };

        let body = MailBody {
            from: &from,
            to: [&message.to],
            subject: &message.subject,
            text: &message.text,
        };

        let response = self
            .http
            .post(&api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
