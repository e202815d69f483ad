use std::path::{Path, PathBuf};

use async_trait::async_trait;
use auth_relay_common::UserRecord;
use tokio::io::AsyncWriteExt;

use super::store::{StoreError, UserStore};

const MAX_ID_LEN: usize = 128;

/// Store that keeps one `<id>.json` file per user.
///
/// A failed write can only ever affect the user being written: records are
/// written to a temporary file and renamed into place.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory.
    ///
    /// Temp files left by an interrupted write are removed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let mut stale = 0;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') && name.ends_with(".tmp") {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => stale += 1,
                    Err(e) => tracing::warn!("Failed to remove stale temp file {}: {}", name, e),
                }
            }
        }
        if stale > 0 {
            tracing::info!("Removed {} stale temp files", stale);
        }

        tracing::info!("File store initialized at {}", dir.display());

        Ok(Self { dir })
    }

    fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Move an unreadable record out of the way as `.<id>.corrupt` so the
    /// id can be written again.
    async fn quarantine(&self, id: &str, path: &Path) -> Result<(), StoreError> {
        let target = self.dir.join(format!(".{}.corrupt", id));
        match tokio::fs::rename(path, &target).await {
            Ok(()) => {
                tracing::warn!("Quarantined unreadable user file as {}", target.display());
                Ok(())
            }
            // Already moved by a concurrent reader.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Ids become file names, so only a conservative character set is allowed.
fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

async fn read_record(path: &Path) -> Result<UserRecord, StoreError> {
    let data = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&data)?)
}

#[async_trait]
impl UserStore for FileStore {
    fn kind(&self) -> &'static str {
        "files"
    }

    fn is_persistent(&self) -> bool {
        true
    }

    async fn load(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let path = self.record_path(id)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&data) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("User file {} is unreadable: {}", path.display(), e);
                self.quarantine(id, &path).await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, record: &UserRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.id)?;
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", record.id, uuid::Uuid::new_v4()));

        let data = serde_json::to_vec_pretty(record)?;

        let write = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp_path, &path).await?;
            Ok::<(), std::io::Error>(())
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!("Saved user {} to {}", record.id, path.display());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.record_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }

            match read_record(&path).await {
                Ok(record) => records.push(record),
                Err(StoreError::Serialization(e)) => {
                    tracing::warn!("User file {} is unreadable: {}", path.display(), e);
                    let id = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if let Err(e) = self.quarantine(&id, &path).await {
                        tracing::warn!("Failed to quarantine {}: {}", path.display(), e);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable user file {}: {}", path.display(), e);
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_record;

    #[tokio::test]
    async fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let record = test_record("1001", "ivan");
        store.save(&record).await.unwrap();

        assert!(dir.path().join("1001.json").exists());

        // A fresh handle on the same directory sees the record.
        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load("1001").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.load("404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_ids_never_touch_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("users")).unwrap();

        for id in ["../escape", "a/b", "", "dot.dot", "space id"] {
            let err = store.load(id).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidId(_)), "id {:?}", id);
        }

        let mut record = test_record("x", "x");
        record.id = "../../etc/passwd".to_string();
        assert!(matches!(
            store.save(&record).await.unwrap_err(),
            StoreError::InvalidId(_)
        ));
        assert!(!dir.path().join("etc").exists());
    }

    #[tokio::test]
    async fn test_load_quarantines_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.save(&test_record("1001", "ivan")).await.unwrap();
        std::fs::write(dir.path().join("1001.json"), b"{truncated").unwrap();

        assert!(store.load("1001").await.unwrap().is_none());
        assert!(!dir.path().join("1001.json").exists());
        assert!(dir.path().join(".1001.corrupt").exists());

        // The id is writable again.
        store.save(&test_record("1001", "ivan")).await.unwrap();
        assert_eq!(store.load("1001").await.unwrap().unwrap().login, "ivan");
    }

    #[test]
    fn test_open_removes_leftover_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".7.0a1b2c3d.tmp"), b"{\"id\":").unwrap();
        std::fs::write(dir.path().join("7.json"), b"{}").unwrap();

        FileStore::open(dir.path()).unwrap();

        assert!(!dir.path().join(".7.0a1b2c3d.tmp").exists());
        assert!(dir.path().join("7.json").exists());
    }

    #[tokio::test]
    async fn test_load_all_skips_corrupt_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.save(&test_record("1", "anna")).await.unwrap();
        store.save(&test_record("2", "boris")).await.unwrap();
        std::fs::write(dir.path().join("3.json"), b"{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join(".4.tmp"), b"{}").unwrap();

        let mut ids: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(dir.path().join(".3.corrupt").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.save(&test_record("7", "vera")).await.unwrap();
        store.save(&test_record("7", "vera2")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["7.json"]);
        assert_eq!(store.load("7").await.unwrap().unwrap().login, "vera2");
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.save(&test_record("5", "gleb")).await.unwrap();
        assert!(store.remove("5").await.unwrap());
        assert!(!store.remove("5").await.unwrap());
        assert!(store.load("5").await.unwrap().is_none());
    }
}
