//! Configuration types for the Aaroh backend.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod admin;
mod email;
mod gateway;
mod server;

pub use admin::AdminConfig;
pub use email::EmailConfig;
pub use gateway::{GatewayConfig, SessionConfig};
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address, etc.).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Admin configuration (authentication).
    pub admin: Arc<RwLock<AdminConfig>>,
    /// Payment gateway credentials and webhook secret.
    pub gateway: Arc<RwLock<GatewayConfig>>,
    /// Session token signing.
    pub session: Arc<RwLock<SessionConfig>>,
    /// Outgoing email.
    pub email: Arc<RwLock<EmailConfig>>,
}
