use std::collections::HashMap;

use async_trait::async_trait;
use auth_relay_common::UserRecord;
use tokio::sync::RwLock;

use super::store::{StoreError, UserStore};

/// Non-persistent store backed by a map.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn is_persistent(&self) -> bool {
        false
    }

    async fn load(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn save(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn load_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
