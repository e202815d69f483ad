//! Request-boundary errors for the relay API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use auth_relay_common::ErrorResponse;

use crate::directory::DirectoryError;
use crate::oauth::OAuthError;

/// Errors surfaced to HTTP callers.
///
/// The body is always `{success: false, error}` with a generic message; the
/// underlying cause is logged where the error is produced.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authorization code is required")]
    MissingCode,

    #[error("Token exchange failed: {0}")]
    ProviderExchangeFailed(String),

    #[error("Profile fetch failed: {0}")]
    ProviderProfileFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[from] DirectoryError),

    #[error("Storage read failed: {0}")]
    Storage(DirectoryError),

    #[error("Unauthorized")]
    Unauthorized,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCode => StatusCode::BAD_REQUEST,
            ApiError::ProviderExchangeFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ProviderProfileFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to hand back to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::MissingCode => "Authorization code is required",
            ApiError::ProviderExchangeFailed(_) | ApiError::ProviderProfileFailed(_) => {
                "Authentication failed"
            }
            ApiError::PersistenceFailed(_) => "Failed to save user",
            ApiError::Storage(_) => "Failed to load users",
            ApiError::Unauthorized => "Unauthorized",
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::Profile(_) => ApiError::ProviderProfileFailed(err.to_string()),
            _ => ApiError::ProviderExchangeFailed(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
