//! Configuration module for aaroh-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;

use crate::config::file::FileConfig;
use aaroh_core::config::{
    AdminConfig, EmailConfig, GatewayConfig, ServerConfig, SessionConfig, SharedConfig,
};
use compact_str::CompactString;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
    pub email: EmailConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            admin: Arc::new(RwLock::new(self.admin)),
            gateway: Arc::new(RwLock::new(self.gateway)),
            session: Arc::new(RwLock::new(self.session)),
            email: Arc::new(RwLock::new(self.email)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            // The listen override is a runtime choice; keep it out of the file.
            let mut persisted = file_config.clone();
            if self.listen_override.is_some() {
                let on_disk: FileConfig = toml::from_str(&config_content)?;
                persisted.server = on_disk.server;
            }
            self.rewrite_config(&persisted)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    ///
    /// Returns a LoadedConfig that can be used to update individual parts
    /// of a SharedConfig.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let required = [
        ("admin.secret", config.admin.secret.as_str()),
        ("gateway.key_id", config.gateway.key_id.as_str()),
        ("gateway.key_secret", config.gateway.key_secret.as_str()),
        ("webhook.secret", config.webhook.secret.as_str()),
        ("session.secret", config.session.secret.as_str()),
        ("email.api_url", config.email.api_url.as_str()),
        ("email.from", config.email.from.as_str()),
        ("email.admin_address", config.email.admin_address.as_str()),
    ];
    if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!("{name} must not be empty")));
    }

    if config.webhook.secret == config.gateway.key_secret {
        return Err(ConfigError::ValidationError(
            "webhook.secret must differ from gateway.key_secret".to_string(),
        ));
    }

    let currency = config.gateway.currency.as_str();
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ConfigError::ValidationError(format!(
            "gateway.currency {currency:?} is not an ISO 4217 code"
        )));
    }

    for (name, value) in [
        ("gateway.api_base", config.gateway.api_base.as_str()),
        ("email.api_url", config.email.api_url.as_str()),
    ] {
        url::Url::parse(value)
            .map_err(|e| ConfigError::ValidationError(format!("{name} is not a valid URL: {e}")))?;
    }

    Ok(())
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    let FileConfig {
        server,
        gateway,
        webhook,
        session,
        email,
        ..
    } = file_config;

    LoadedConfig {
        server: ServerConfig {
            listen: server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        gateway: GatewayConfig {
            key_id: gateway.key_id,
            key_secret: gateway.key_secret.into_bytes().into_boxed_slice(),
            webhook_secret: webhook.secret.into_bytes().into_boxed_slice(),
            api_base: gateway.api_base.trim_end_matches('/').to_string(),
            currency: CompactString::from(gateway.currency),
        },
        session: SessionConfig {
            secret: session.secret.into_bytes().into_boxed_slice(),
        },
        email: EmailConfig {
            api_url: email.api_url,
            api_key: email.api_key,
            from: email.from,
            admin_address: email.admin_address,
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
