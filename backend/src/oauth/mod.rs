//! Identity provider abstraction.
//!
//! The relay only needs the two legs of the authorization-code flow: trade a
//! code for an access token, then trade the token for a profile. They sit
//! behind `IdentityProvider` so handlers can be driven by a fake in tests.

mod yandex;

pub use yandex::YandexClient;

use async_trait::async_trait;
use auth_relay_common::RawProfile;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Token request failed: {0}")]
    TokenExchange(String),
    #[error("Provider returned no access token")]
    MissingAccessToken,
    #[error("Profile request failed: {0}")]
    Profile(String),
    #[error("Provider request timed out")]
    Timeout,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name for logs (e.g. "yandex").
    fn name(&self) -> &'static str;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    /// Fetch the profile of the user the access token belongs to.
    async fn fetch_profile(&self, access_token: &str) -> Result<RawProfile, OAuthError>;

    /// Run both legs of the exchange.
    async fn authenticate(&self, code: &str) -> Result<RawProfile, OAuthError> {
        let access_token = self.exchange_code(code).await?;
        self.fetch_profile(&access_token).await
    }
}
