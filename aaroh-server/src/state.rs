//! Application state shared across all request handlers.

use aaroh_core::clients::GatewayClient;
use aaroh_core::config::SharedConfig;
use aaroh_core::events::NotificationSender;
use aaroh_core::framework::DatabaseProcessor;
use aaroh_core::lifecycle::{OrderLifecycle, PaymentSettings};
use aaroh_core::utils::OtpStore;
use sqlx::PgPool;
use std::sync::Arc;

/// Lifecycle service as wired in production.
pub type Lifecycle = OrderLifecycle<DatabaseProcessor, GatewayClient>;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Feeds the notifier task.
    pub notifications: NotificationSender,
    /// Pending login codes.
    pub otp: Arc<OtpStore>,
    pub gateway: GatewayClient,
}

impl AppState {
    pub fn new(db: PgPool, config: SharedConfig, notifications: NotificationSender) -> Self {
        let gateway = GatewayClient::new(config.gateway.clone());
        Self {
            db,
            config,
            notifications,
            otp: Arc::new(OtpStore::new()),
            gateway,
        }
    }

    pub fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor::new(self.db.clone())
    }

    /// Lifecycle service bound to the current gateway credentials.
    pub async fn lifecycle(&self) -> Lifecycle {
        let payment = PaymentSettings::from(&*self.config.gateway.read().await);
        OrderLifecycle::new(
            self.processor(),
            self.gateway.clone(),
            self.notifications.clone(),
            payment,
        )
    }
}
