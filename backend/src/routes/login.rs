use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use auth_relay_common::{AuthRequest, AuthResponse, PublicUser};

use crate::error::{ApiError, Result};
use crate::AppState;

/// POST /api/yandex-auth - exchange an authorization code and record the user.
///
/// A malformed or missing body is treated the same as a missing code.
async fn yandex_auth(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<AuthRequest>>,
) -> Result<Json<AuthResponse>> {
    tracing::info!("Received authorization request");

    let code = payload
        .and_then(|Json(request)| request.code)
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .ok_or(ApiError::MissingCode)?;

    let profile = state.provider.authenticate(&code).await.map_err(|e| {
        tracing::error!(provider = state.provider.name(), "Authorization failed: {}", e);
        ApiError::from(e)
    })?;

    let record = state.directory.upsert(&profile).await?;

    if record.avatar_url.is_none() {
        tracing::debug!("User {} has no avatar", record.id);
    }

    Ok(Json(AuthResponse {
        success: true,
        user: PublicUser::from(&record),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/yandex-auth", post(yandex_auth))
        .with_state(state)
}
