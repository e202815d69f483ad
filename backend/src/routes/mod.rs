//! HTTP routes.

pub mod admin;
pub mod health;
pub mod login;
pub mod users;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// All routes, without the outer middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router(state.clone()))
        .merge(login::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(admin::router(state))
}
