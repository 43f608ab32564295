//! Server configuration loading from file and environment variables.

use rehearse_identity::AuthConfig;
use rehearse_voice::RealtimeConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session token verification.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Realtime voice credential minting.
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of a pre-built client bundle served as a fallback.
    #[serde(default)]
    pub client_dir: Option<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "rehearse_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "rehearse.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_dir: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    pub fn runtime_settings(&self) -> rehearse_db::DbRuntimeSettings {
        rehearse_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides (see [`apply_env_overrides`]).
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Overrides config values from variables returned by `lookup`.
///
/// - `REHEARSE_HOST` / `REHEARSE_PORT` override `server.host` / `server.port`
/// - `REHEARSE_CLIENT_DIR` overrides `server.client_dir`
/// - `REHEARSE_DB_PATH` overrides `database.path`
/// - `REHEARSE_LOG_LEVEL` overrides `logging.level`
/// - `REHEARSE_LOG_JSON` overrides `logging.json` ("true" or "1")
/// - `REHEARSE_AUTH_SECRET`, `REHEARSE_AUTH_PUBLIC_KEY_PATH` and
///   `REHEARSE_AUTH_ISSUER` override the `auth` section
/// - `REHEARSE_REALTIME_BASE_URL` overrides `realtime.base_url`
/// - `OPENAI_API_KEY` overrides `realtime.api_key`
///
/// Unparseable host/port values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("REHEARSE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("REHEARSE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(dir) = lookup("REHEARSE_CLIENT_DIR") {
        config.server.client_dir = Some(dir);
    }
    if let Some(db_path) = lookup("REHEARSE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = lookup("REHEARSE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("REHEARSE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(secret) = lookup("REHEARSE_AUTH_SECRET") {
        config.auth.secret = secret;
    }
    if let Some(path) = lookup("REHEARSE_AUTH_PUBLIC_KEY_PATH") {
        config.auth.public_key_path = Some(path);
    }
    if let Some(issuer) = lookup("REHEARSE_AUTH_ISSUER") {
        config.auth.issuer = Some(issuer);
    }
    if let Some(base_url) = lookup("REHEARSE_REALTIME_BASE_URL") {
        config.realtime.base_url = base_url;
    }
    if let Some(api_key) = lookup("OPENAI_API_KEY") {
        config.realtime.api_key = api_key;
    }
}
