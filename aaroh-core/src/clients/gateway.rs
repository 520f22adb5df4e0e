//! Payment gateway REST client.

use crate::config::GatewayConfig;
use compact_str::CompactString;
use kanau::processor::Processor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Create an order on the gateway for `amount` minor units.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGatewayOrder {
    pub amount: i64,
    pub currency: CompactString,
    /// Our own reference, echoed back on the gateway dashboard.
    pub receipt: String,
}

/// The subset of the gateway's order object we keep.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    config: Arc<RwLock<GatewayConfig>>,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(config: Arc<RwLock<GatewayConfig>>) -> Self {
        Self {
            config,
            http: super::http_client(),
        }
    }
}

impl Processor<CreateGatewayOrder> for GatewayClient {
    type Output = GatewayOrder;
    type Error = GatewayError;
    #[tracing::instrument(skip_all, err, name = "HTTP:CreateGatewayOrder")]
    async fn process(&self, order: CreateGatewayOrder) -> Result<GatewayOrder, GatewayError> {
        let (url, key_id, key_secret) = {
            let config = self.config.read().await;
            (
                format!("{}/v1/orders", config.api_base.trim_end_matches('/')),
                config.key_id.clone(),
                String::from_utf8_lossy(&config.key_secret).into_owned(),
            )
        };

        let response = self
            .http
            .post(&url)
            .basic_auth(key_id, Some(key_secret))
            .json(&order)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: GatewayOrder = response.json().await?;
        tracing::info!(
            external_order_id = %created.id,
            receipt = %order.receipt,
            amount = order.amount,
            "Gateway order created"
        );
        Ok(created)
    }
}
