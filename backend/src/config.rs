//! Configuration for the auth relay.

use std::env;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Identity provider credentials and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_info_url")]
    pub info_url: String,
    /// Timeout for each outbound provider call, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per user inside `data_dir`.
    #[default]
    Files,
    /// Process memory; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Records whose last login is older than this are pruned.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    /// Run prune in the background on this interval. Unset disables the sweep.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            sweep_interval_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// Bearer token guarding the admin endpoints. Unset leaves them open.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated allowed origins, or `*`.
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    10000
}
fn default_token_url() -> String {
    "https://oauth.yandex.ru/token".to_string()
}
fn default_info_url() -> String {
    "https://login.yandex.ru/info".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_data_dir() -> String {
    "./data/users".to_string()
}
fn default_max_age_days() -> u32 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. `CLIENT_ID`, `CLIENT_SECRET` and `PORT`
    /// 2. Environment variables (RELAY__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("retention.max_age_days", default_max_age_days() as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("oauth.client_id", env::var("CLIENT_ID").ok())?
            .set_override_option("oauth.client_secret", env::var("CLIENT_SECRET").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(ConfigError::Message("oauth.client_id (CLIENT_ID) is empty".to_string()));
        }
        if self.oauth.client_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "oauth.client_secret (CLIENT_SECRET) is empty".to_string(),
            ));
        }
        if self.oauth.timeout_secs == 0 {
            return Err(ConfigError::Message("oauth.timeout_secs must be positive".to_string()));
        }
        if self.storage.backend == StorageBackend::Files && self.storage.data_dir.trim().is_empty() {
            return Err(ConfigError::Message("storage.data_dir is empty".to_string()));
        }
        Ok(())
    }
}
