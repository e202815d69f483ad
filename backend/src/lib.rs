pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod routes;
pub mod test_util;

pub use config::Config;
pub use directory::{DirectoryError, DirectoryStats, FileStore, MemoryStore, UserDirectory, UserStore};
pub use error::ApiError;
pub use oauth::{IdentityProvider, OAuthError, YandexClient};

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Identity provider the authorization codes are exchanged with.
    pub provider: Arc<dyn IdentityProvider>,
    /// Persisted users.
    pub directory: Arc<UserDirectory>,
}

impl AppState {
    pub fn new(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<UserDirectory>,
    ) -> Self {
        Self {
            config,
            provider,
            directory,
        }
    }
}

/// Build the CORS layer from a comma-separated origin list (`*` for any).
pub fn cors_layer(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Full application router with middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors.origins);

    routes::router(state)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
