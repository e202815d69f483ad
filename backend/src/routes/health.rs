use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use auth_relay_common::StatusResponse;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/test - liveness plus a short description of the deployment.
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Server is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        has_database: state.directory.is_persistent(),
        admin_panel: "/admin".to_string(),
        features: vec![
            format!("{}_oauth", state.provider.name()),
            "avatar_support".to_string(),
            format!("storage_{}", state.directory.store_kind()),
        ],
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/test", get(status))
        .with_state(state)
}
