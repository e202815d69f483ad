use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{delete, get},
    Json, Router,
};

use auth_relay_common::{PruneResponse, StatsResponse, UsersResponse};

use crate::error::{ApiError, Result};
use crate::routes::admin::require_admin;
use crate::AppState;

/// GET /api/users - every user, most recent login first.
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<UsersResponse>> {
    let users = state.directory.list().await.map_err(ApiError::Storage)?;
    let total = users.len();
    Ok(Json(UsersResponse {
        success: true,
        users,
        total,
    }))
}

/// GET /api/stats
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>> {
    let stats = state.directory.stats().await.map_err(ApiError::Storage)?;
    Ok(Json(StatsResponse {
        success: true,
        total_users: stats.total_users,
        last_user: stats.last_user,
    }))
}

/// DELETE /api/users/old - prune users past the retention window.
async fn prune_old_users(State(state): State<Arc<AppState>>) -> Result<Json<PruneResponse>> {
    let max_age_days = state.config.retention.max_age_days;
    let removed = state
        .directory
        .prune(max_age_days)
        .await
        .map_err(ApiError::Storage)?;

    Ok(Json(PruneResponse {
        success: true,
        removed,
        message: format!(
            "Removed {} users inactive for more than {} days",
            removed, max_age_days
        ),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/stats", get(stats))
        .route("/api/users/old", delete(prune_old_users))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
