//! Storage backends for the user directory.

use async_trait::async_trait;
use auth_relay_common::UserRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid user id: {0:?}")]
    InvalidId(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Raw persistence for user records, keyed by provider id.
///
/// Implementations only store and fetch; merge rules and write
/// serialization live in `UserDirectory`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Backend name for logs and the status endpoint.
    fn kind(&self) -> &'static str;

    /// Whether records survive a restart.
    fn is_persistent(&self) -> bool;

    async fn load(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Durably write one record, replacing any previous version.
    async fn save(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Returns whether a record was removed.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;

    /// All records, in no particular order.
    async fn load_all(&self) -> Result<Vec<UserRecord>, StoreError>;
}
