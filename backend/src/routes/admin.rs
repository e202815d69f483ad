//! Admin routes.
//!
//! Provides:
//! - Read-only HTML report of the user directory (`/admin`)
//! - The `require_admin` guard shared with the JSON user endpoints

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use auth_relay_common::UserRecord;

use crate::error::ApiError;
use crate::AppState;

/// Middleware that requires `Authorization: Bearer <admin.token>` when an
/// admin token is configured. Without one every request passes.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.admin.token.as_deref() else {
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| tokens_match(token, expected));

    if !authorized {
        tracing::warn!("Rejected admin request to {}", request.uri().path());
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

/// Compare a presented token with the configured one in constant time.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// GET /admin - HTML table of all users.
async fn admin_page(State(state): State<Arc<AppState>>) -> Response {
    match state.directory.list().await {
        Ok(users) => Html(render_admin_page(&users)).into_response(),
        Err(e) => {
            tracing::error!("Failed to load admin panel: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>500</h1><p>Failed to load the admin panel.</p>"),
            )
                .into_response()
        }
    }
}

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:20px;}\
.container{max-width:1200px;margin:0 auto;}h1{color:#333;}\
table{width:100%;border-collapse:collapse;}th,td{padding:10px;border:1px solid #ddd;}\
th{background:#f5f5f5;}";

/// Render the admin report. `users` is expected in `list()` order, so the
/// first entry is the most recent login.
pub fn render_admin_page(users: &[UserRecord]) -> String {
    let mut html = String::with_capacity(1024 + users.len() * 256);

    html.push_str("<!DOCTYPE html><html><head><title>Admin panel</title>");
    html.push_str("<meta charset=\"UTF-8\"><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body><div class=\"container\"><h1>Admin panel</h1>");

    html.push_str("<h3>Statistics</h3>");
    let _ = write!(html, "<p>Total users: <strong>{}</strong></p>", users.len());
    if let Some(latest) = users.first() {
        let _ = write!(
            html,
            "<p>Last login: <strong>{}</strong></p>",
            format_time(&latest.last_login)
        );
    }

    html.push_str("<h3>Users</h3>");
    if users.is_empty() {
        html.push_str("<p>No users yet</p>");
    } else {
        html.push_str(
            "<table><tr><th>ID</th><th>Name</th><th>Email</th><th>Avatar</th>\
             <th>Sex</th><th>First login</th><th>Last login</th></tr>",
        );
        for user in users {
            let _ = write!(
                html,
                "<tr><td>{}</td><td><strong>{}</strong></td><td>{}</td><td>{}</td>\
                 <td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&user.id),
                escape_html(&user.display_name()),
                escape_html(&user.email),
                if user.avatar_url.is_some() { "Yes" } else { "No" },
                user.sex.label(),
                format_time(&user.first_login),
                format_time(&user.last_login),
            );
        }
        html.push_str("</table>");
    }

    html.push_str("</div></body></html>");
    html
}

fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin", get(admin_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
