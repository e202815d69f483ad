pub mod mock_yandex;

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use auth_relay_common::{ProfileUpdate, RawProfile, Sex, UserRecord};

use crate::config::{
    AdminConfig, Config, CorsConfig, LoggingConfig, OAuthConfig, RetentionConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
use crate::directory::{MemoryStore, UserDirectory};
use crate::oauth::YandexClient;
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 10000,
        },
        oauth: OAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            token_url: "http://127.0.0.1:1/token".to_string(),
            info_url: "http://127.0.0.1:1/info".to_string(),
            timeout_secs: 10,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            data_dir: String::new(),
        },
        retention: RetentionConfig::default(),
        admin: AdminConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig::default(),
    }
}

/// Test config whose provider endpoints point at `base_url` (a mock server).
pub fn test_config_with_provider(base_url: &str) -> Config {
    let mut config = test_config();
    config.oauth.token_url = format!("{}/token", base_url.trim_end_matches('/'));
    config.oauth.info_url = format!("{}/info", base_url.trim_end_matches('/'));
    config
}

/// State with an in-memory directory and a real Yandex client built from
/// `config`.
pub fn create_test_state(config: Config) -> Arc<AppState> {
    let provider = Arc::new(YandexClient::new(&config.oauth));
    let directory = Arc::new(UserDirectory::new(Arc::new(MemoryStore::new())));
    Arc::new(AppState::new(config, provider, directory))
}

pub fn test_profile(id: &str) -> RawProfile {
    RawProfile {
        id: id.to_string(),
        login: Some(format!("user{}", id.trim())),
        default_email: Some(format!("user{}@yandex.ru", id.trim())),
        emails: vec![format!("user{}@yandex.ru", id.trim())],
        first_name: Some("Ivan".to_string()),
        last_name: Some("Petrov".to_string()),
        sex: Some("male".to_string()),
        ..Default::default()
    }
}

pub fn test_update(id: &str) -> ProfileUpdate {
    test_profile(id).to_update()
}

/// A stored record with fixed timestamps.
pub fn test_record(id: &str, login: &str) -> UserRecord {
    let first = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let last = Utc.with_ymd_and_hms(2024, 5, 2, 12, 30, 0).unwrap();
    UserRecord {
        id: id.to_string(),
        login: login.to_string(),
        email: format!("{}@yandex.ru", login),
        first_name: Some("Ivan".to_string()),
        last_name: Some("Petrov".to_string()),
        sex: Sex::Male,
        avatar_url: None,
        first_login: first,
        last_login: last,
        updated_at: Some(last),
    }
}
