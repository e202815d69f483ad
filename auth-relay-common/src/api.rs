//! JSON bodies of the relay's HTTP API.

use serde::{Deserialize, Serialize};

use crate::user::{Sex, UserRecord};

/// Body of `POST /api/yandex-auth`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// User fields echoed back to the client after a successful exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub login: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Sex,
    pub avatar_url: Option<String>,
}

impl From<&UserRecord> for PublicUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            login: record.login.clone(),
            email: record.email.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            sex: record.sex,
            avatar_url: record.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Failure body shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Response for `GET /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserRecord>,
    pub total: usize,
}

/// Response for `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub total_users: usize,
    /// Most recently logged-in user, null when the directory is empty
    pub last_user: Option<UserRecord>,
}

/// Response for `DELETE /api/users/old`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneResponse {
    pub success: bool,
    pub removed: usize,
    pub message: String,
}

/// Response for `GET /api/test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub version: String,
    pub has_database: bool,
    pub admin_panel: String,
    pub features: Vec<String>,
}
