//! Configuration loading and representation.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional config file,
//! `CUTLERY__*` environment variables (`__` separates sections, e.g.
//! `CUTLERY__SERVER__PORT`), and finally `DATABASE_URL` for `database.url`.

use std::net::SocketAddr;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use cutlery_inventory::DEFAULT_VENUE;
pub use cutlery_observability::LogFormat;

/// Default config file name (without extension).
pub const DEFAULT_CONFIG_FILE: &str = "cutlery";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub inventory: InventoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL. When absent the service runs on the in-memory store.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Create the schema at startup.
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Venue listed when a request does not name one.
    pub default_venue: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl AppConfig {
    /// Load configuration from `cutlery.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from the given file path (without extension) and the environment.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("CUTLERY")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.max_connections", 5)?
        .set_default("database.acquire_timeout_secs", 5)?
        .set_default("database.run_migrations", false)?
        .set_default("inventory.default_venue", DEFAULT_VENUE)?
        .set_default("logging.format", "json")
}
