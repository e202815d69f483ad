use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use auth_relay_common::RawProfile;

use super::{IdentityProvider, OAuthError};
use crate::config::OAuthConfig;

/// Client for the Yandex OAuth token endpoint and the login info API.
pub struct YandexClient {
    http_client: Client,
    token_url: String,
    info_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

/// Token endpoint response. On failure Yandex sends `error` and
/// `error_description` instead of a token.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl YandexClient {
    pub fn new(config: &OAuthConfig) -> Self {
        Self {
            http_client: Client::new(),
            token_url: config.token_url.clone(),
            info_url: config.info_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn profile_error(e: reqwest::Error) -> OAuthError {
    if e.is_timeout() {
        OAuthError::Timeout
    } else {
        OAuthError::Profile(e.to_string())
    }
}

#[async_trait]
impl IdentityProvider for YandexClient {
    fn name(&self) -> &'static str {
        "yandex"
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.trim()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        tracing::debug!("Requesting access token from {}", self.token_url);

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OAuthError::Timeout
                } else {
                    OAuthError::TokenExchange(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                OAuthError::Timeout
            } else {
                OAuthError::TokenExchange(e.to_string())
            }
        })?;

        let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let detail = parsed
                .and_then(|t| t.error_description.or(t.error))
                .unwrap_or(body);
            return Err(OAuthError::TokenExchange(format!("{}: {}", status, detail)));
        }

        parsed
            .and_then(|t| t.access_token)
            .filter(|t| !t.is_empty())
            .ok_or(OAuthError::MissingAccessToken)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<RawProfile, OAuthError> {
        let response = self
            .http_client
            .get(&self.info_url)
            .query(&[("format", "json")])
            .header(reqwest::header::AUTHORIZATION, format!("OAuth {}", access_token))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(profile_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Profile(format!("{}: {}", status, body)));
        }

        let profile: RawProfile = response.json().await.map_err(profile_error)?;

        if profile.id.trim().is_empty() {
            return Err(OAuthError::Profile("profile has no id".to_string()));
        }

        Ok(profile)
    }
}
