use std::{env, net::SocketAddr};

use tracing::warn;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/mcphub.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("ADMIN_TOKEN must be set in production")]
    MissingAdminToken,
}

/// Process configuration, read from the environment (and `.env` via dotenvy
/// in the binaries).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub admin_token: Option<String>,
    pub seed_sample_servers: bool,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DB_MAX_CONNECTIONS",
                value: raw,
            })?,
            Err(_) => 5,
        };

        let admin_token = env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());

        let config = AppConfig {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            max_connections,
            admin_token,
            seed_sample_servers: env_flag("SEED_SAMPLE_SERVERS", true),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_token.is_none() {
            if self.is_production() {
                return Err(ConfigError::MissingAdminToken);
            }
            warn!("ADMIN_TOKEN not set; admin routes are unprotected (development only)");
        }
        Ok(())
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}
