use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_relay::directory::spawn_prune_sweep;
use auth_relay::{app, AppState, Config, UserDirectory, YandexClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Set CLIENT_ID and CLIENT_SECRET, or provide them in config.toml.",
            e
        )
    })?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.logging.level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting auth relay v{}", env!("CARGO_PKG_VERSION"));

    // Initialize components
    let provider = Arc::new(YandexClient::new(&config.oauth));
    let directory = Arc::new(UserDirectory::from_config(&config.storage)?);
    tracing::info!("User directory backend: {}", directory.store_kind());

    if let Some(secs) = config.retention.sweep_interval_secs.filter(|s| *s > 0) {
        spawn_prune_sweep(
            directory.clone(),
            config.retention.max_age_days,
            Duration::from_secs(secs),
        );
        tracing::info!(
            "Prune sweep every {}s (retention {} days)",
            secs,
            config.retention.max_age_days
        );
    }

    if config.admin.token.is_none() {
        tracing::warn!("admin.token is not set, admin endpoints are open");
    }

    let state = Arc::new(AppState::new(config.clone(), provider, directory));
    let app = app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);
    tracing::info!("Status: http://localhost:{}/api/test", config.server.port);
    tracing::info!("Admin panel: http://localhost:{}/admin", config.server.port);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
