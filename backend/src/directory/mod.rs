//! User directory: the persisted, de-duplicated set of users who have logged
//! in through the relay.
//!
//! `UserDirectory` owns the merge rules and serializes every mutation through
//! a single async mutex, so two exchanges for the same user can never
//! interleave their read-modify-write. The actual bytes live in a
//! [`UserStore`] backend chosen at startup.

mod file;
mod memory;
mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{StoreError, UserStore};

use std::sync::Arc;
use std::time::Duration;

use auth_relay_common::{ProfileUpdate, RawProfile, UserRecord};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::{StorageBackend, StorageConfig};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Profile has no user id")]
    MissingId,
}

/// Summary shown by `/api/stats` and the admin page.
#[derive(Debug, Clone)]
pub struct DirectoryStats {
    pub total_users: usize,
    /// User with the most recent login
    pub last_user: Option<UserRecord>,
}

pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    write_lock: Mutex<()>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Build the directory with the backend named in the configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self, DirectoryError> {
        let store: Arc<dyn UserStore> = match config.backend {
            StorageBackend::Files => Arc::new(FileStore::open(&config.data_dir)?),
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory user store, records will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(store))
    }

    pub fn store_kind(&self) -> &'static str {
        self.store.kind()
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    /// Insert or update the user described by a provider profile.
    pub async fn upsert(&self, profile: &RawProfile) -> Result<UserRecord, DirectoryError> {
        self.upsert_at(profile.to_update(), Utc::now()).await
    }

    /// Insert or update with an explicit clock reading.
    pub async fn upsert_at(
        &self,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DirectoryError> {
        if update.id.trim().is_empty() {
            return Err(DirectoryError::MissingId);
        }

        let _guard = self.write_lock.lock().await;

        let existing = self.store.load(&update.id).await.map_err(|e| {
            tracing::error!("Failed to load user {}: {}", update.id, e);
            e
        })?;

        let record = match existing {
            Some(mut record) => {
                record.merge(update, now);
                record
            }
            None => {
                let record = UserRecord::create(update, now);
                tracing::info!("Created new user: {} ({})", record.id, record.email);
                record
            }
        };

        self.store.save(&record).await.map_err(|e| {
            tracing::error!("Failed to save user {}: {}", record.id, e);
            e
        })?;

        tracing::info!("User saved: {} ({})", record.id, record.email);
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.store.load(id).await?)
    }

    /// All users, most recent login first. Ties are ordered by id.
    pub async fn list(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let mut records = self.store.load_all().await?;
        records.sort_by(|a, b| {
            b.last_login
                .cmp(&a.last_login)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    pub async fn stats(&self) -> Result<DirectoryStats, DirectoryError> {
        let records = self.list().await?;
        Ok(DirectoryStats {
            total_users: records.len(),
            last_user: records.into_iter().next(),
        })
    }

    /// Remove users whose last login is more than `max_age_days` ago.
    ///
    /// A window reaching past the earliest representable time prunes nothing.
    pub async fn prune(&self, max_age_days: u32) -> Result<usize, DirectoryError> {
        let window = chrono::Duration::days(i64::from(max_age_days));
        match Utc::now().checked_sub_signed(window) {
            Some(cutoff) => self.prune_before(cutoff).await,
            None => {
                tracing::debug!("Retention of {} days covers all time", max_age_days);
                Ok(0)
            }
        }
    }

    /// Remove users whose last login is strictly before `cutoff`.
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DirectoryError> {
        let _guard = self.write_lock.lock().await;

        let mut removed = 0;
        for record in self.store.load_all().await? {
            if record.last_login < cutoff && self.store.remove(&record.id).await? {
                tracing::debug!("Pruned user {} (last login {})", record.id, record.last_login);
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!("Pruned {} users inactive since {}", removed, cutoff.to_rfc3339());
        }
        Ok(removed)
    }
}

/// Periodically prune users older than `max_age_days`.
pub fn spawn_prune_sweep(
    directory: Arc<UserDirectory>,
    max_age_days: u32,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately; skip it so startup doesn't prune.
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = directory.prune(max_age_days).await {
                tracing::error!("Background prune failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_profile, test_update};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    fn memory_directory() -> UserDirectory {
        UserDirectory::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_upsert_new_user_creates_one_record() {
        let directory = memory_directory();
        let record = directory.upsert(&test_profile("1001")).await.unwrap();

        assert_eq!(record.first_login, record.last_login);
        assert_eq!(directory.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_existing_user_updates_in_place() {
        let directory = memory_directory();
        let t0 = Utc::now();

        let first = directory.upsert_at(test_update("1001"), t0).await.unwrap();
        let second = directory
            .upsert_at(test_update("1001"), t0 + ChronoDuration::seconds(30))
            .await
            .unwrap();
        let third = directory
            .upsert_at(test_update("1001"), t0 + ChronoDuration::seconds(60))
            .await
            .unwrap();

        assert_eq!(directory.list().await.unwrap().len(), 1);
        assert_eq!(second.first_login, first.first_login);
        assert_eq!(third.first_login, first.first_login);
        assert!(second.last_login > first.last_login);
        assert!(third.last_login > second.last_login);
    }

    #[tokio::test]
    async fn test_upsert_missing_email_stores_placeholder() {
        let directory = memory_directory();
        let mut profile = test_profile("1001");
        profile.default_email = None;
        profile.emails.clear();

        let record = directory.upsert(&profile).await.unwrap();
        assert_eq!(record.email, "no-email");
    }

    #[tokio::test]
    async fn test_upsert_avatar_rules() {
        let directory = memory_directory();

        let mut zero = test_profile("1");
        zero.default_avatar_id = Some("0".to_string());
        assert!(directory.upsert(&zero).await.unwrap().avatar_url.is_none());

        let mut absent = test_profile("2");
        absent.default_avatar_id = None;
        assert!(directory.upsert(&absent).await.unwrap().avatar_url.is_none());

        let mut real = test_profile("3");
        real.default_avatar_id = Some("12345".to_string());
        assert_eq!(
            directory.upsert(&real).await.unwrap().avatar_url.as_deref(),
            Some("https://avatars.yandex.net/get-yapic/12345/islands-200")
        );
    }

    #[tokio::test]
    async fn test_upsert_rejects_empty_id() {
        let directory = memory_directory();
        let err = directory.upsert(&test_profile("  ")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::MissingId));
    }

    #[tokio::test]
    async fn test_list_orders_by_last_login_desc() {
        let directory = memory_directory();
        let t0 = Utc::now();

        directory.upsert_at(test_update("a"), t0).await.unwrap();
        directory
            .upsert_at(test_update("b"), t0 + ChronoDuration::minutes(2))
            .await
            .unwrap();
        directory
            .upsert_at(test_update("c"), t0 + ChronoDuration::minutes(1))
            .await
            .unwrap();
        directory
            .upsert_at(test_update("d"), t0 + ChronoDuration::minutes(2))
            .await
            .unwrap();

        let ids: Vec<String> = directory
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "d", "c", "a"]);
    }

    #[tokio::test]
    async fn test_stats() {
        let directory = memory_directory();
        let empty = directory.stats().await.unwrap();
        assert_eq!(empty.total_users, 0);
        assert!(empty.last_user.is_none());

        let t0 = Utc::now();
        directory.upsert_at(test_update("old"), t0).await.unwrap();
        directory
            .upsert_at(test_update("new"), t0 + ChronoDuration::hours(1))
            .await
            .unwrap();

        let stats = directory.stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.last_user.unwrap().id, "new");
    }

    #[tokio::test]
    async fn test_prune_removes_only_stale_users() {
        let directory = memory_directory();
        let now = Utc::now();

        directory
            .upsert_at(test_update("stale"), now - ChronoDuration::days(45))
            .await
            .unwrap();
        directory
            .upsert_at(test_update("fresh"), now - ChronoDuration::days(3))
            .await
            .unwrap();

        assert_eq!(directory.prune(30).await.unwrap(), 1);
        let remaining = directory.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "fresh");
    }

    #[tokio::test]
    async fn test_prune_with_cutoff_after_everything_empties_directory() {
        let directory = memory_directory();
        for id in ["1", "2", "3"] {
            directory.upsert(&test_profile(id)).await.unwrap();
        }
        assert_eq!(directory.list().await.unwrap().len(), 3);

        let removed = directory
            .prune_before(Utc::now() + ChronoDuration::seconds(1))
            .await
            .unwrap();
        assert_eq!(removed, 3);
        assert!(directory.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_same_id_keep_one_record() {
        let directory = Arc::new(memory_directory());

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let directory = directory.clone();
                tokio::spawn(async move { directory.upsert(&test_profile("1001")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = directory.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].last_login >= records[0].first_login);
    }

    #[tokio::test]
    async fn test_file_backed_directory_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Files,
            data_dir: dir.path().to_string_lossy().into_owned(),
        };

        let directory = UserDirectory::from_config(&config).unwrap();
        assert!(directory.is_persistent());
        let created = directory.upsert(&test_profile("1001")).await.unwrap();

        let reopened = UserDirectory::from_config(&config).unwrap();
        let loaded = reopened.get("1001").await.unwrap().unwrap();
        assert_eq!(loaded.first_login, created.first_login);
    }

    #[tokio::test]
    async fn test_upsert_recreates_user_after_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Files,
            data_dir: dir.path().to_string_lossy().into_owned(),
        };
        let directory = UserDirectory::from_config(&config).unwrap();
        let t0 = Utc::now() - ChronoDuration::days(3);
        directory.upsert_at(test_update("1001"), t0).await.unwrap();

        std::fs::write(dir.path().join("1001.json"), b"{truncated").unwrap();

        let t1 = Utc::now();
        let record = directory.upsert_at(test_update("1001"), t1).await.unwrap();
        assert_eq!(record.first_login, t1);
        assert_eq!(directory.list().await.unwrap().len(), 1);
        assert!(dir.path().join(".1001.corrupt").exists());
    }

    #[tokio::test]
    async fn test_prune_with_huge_retention_removes_nothing() {
        let directory = memory_directory();
        directory
            .upsert_at(test_update("1"), Utc::now() - ChronoDuration::days(400))
            .await
            .unwrap();

        assert_eq!(directory.prune(u32::MAX).await.unwrap(), 0);
        assert_eq!(directory.prune(100_000_000).await.unwrap(), 0);
        assert_eq!(directory.list().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_sweep_removes_stale_users_each_interval() {
        let directory = Arc::new(memory_directory());
        directory
            .upsert_at(test_update("stale"), Utc::now() - ChronoDuration::days(45))
            .await
            .unwrap();
        directory
            .upsert_at(test_update("fresh"), Utc::now())
            .await
            .unwrap();

        let sweep = spawn_prune_sweep(directory.clone(), 30, Duration::from_secs(60));

        // Startup tick is skipped.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(directory.list().await.unwrap().len(), 2);

        tokio::time::sleep(Duration::from_secs(61)).await;
        let ids: Vec<String> = directory
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["fresh"]);

        sweep.abort();
    }

    struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        fn kind(&self) -> &'static str {
            "failing"
        }

        fn is_persistent(&self) -> bool {
            true
        }

        async fn load(&self, _id: &str) -> Result<Option<UserRecord>, StoreError> {
            Ok(None)
        }

        async fn save(&self, _record: &UserRecord) -> Result<(), StoreError> {
            Err(StoreError::Io("read-only file system".to_string()))
        }

        async fn remove(&self, _id: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn load_all(&self) -> Result<Vec<UserRecord>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_upsert_surfaces_store_failure() {
        let directory = UserDirectory::new(Arc::new(FailingStore));
        let err = directory.upsert(&test_profile("1001")).await.unwrap_err();
        assert!(err.to_string().contains("read-only file system"));
    }
}
