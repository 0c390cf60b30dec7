//! JSON documents on disk, one file per entity, with locked writes.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::keyed_lock::KeyedLock;
use crate::infrastructure::ports::RepoError;

/// Reads are unlocked (last writer wins). Writes hold the caller's lock key,
/// create the parent directory, then land via temp file + rename so readers
/// never see a partial document.
#[derive(Clone, Default)]
pub struct JsonFileStore {
    locks: Arc<KeyedLock>,
}

impl JsonFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the file does not exist.
    pub async fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, RepoError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::io("read", format!("{}: {}", path.display(), e))),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| RepoError::serialization(format!("{}: {}", path.display(), e)))
    }

    pub async fn exists(&self, path: &Path) -> Result<bool, RepoError> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| RepoError::io("exists", format!("{}: {}", path.display(), e)))
    }

    /// Run `critical_section` under `lock_key`. Use [`Self::write_within_lock`]
    /// inside it.
    pub async fn run_with_lock<T, F, Fut>(&self, lock_key: &str, critical_section: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.locks.run_with_lock(lock_key, critical_section).await
    }

    pub async fn write<T: Serialize>(
        &self,
        lock_key: &str,
        path: &Path,
        value: &T,
    ) -> Result<(), RepoError> {
        self.run_with_lock(lock_key, || self.write_within_lock(path, value))
            .await
    }

    /// Write without taking a lock. The caller must already hold the lock
    /// for the entity this path belongs to.
    pub async fn write_within_lock<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), RepoError> {
        prepare_target(path).await?;

        let bytes = serde_json::to_vec_pretty(value).map_err(RepoError::serialization)?;
        let temp_path = temp_path_for(path);

        if let Err(e) = tokio::fs::write(&temp_path, &bytes).await {
            return Err(RepoError::io("write", format!("{}: {}", temp_path.display(), e)));
        }
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(RepoError::io("rename", format!("{}: {}", path.display(), e)));
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote JSON document");
        Ok(())
    }

    /// Locked read-modify-write. `apply` sees `None` for a missing document.
    pub async fn update<T, F>(&self, lock_key: &str, path: &Path, apply: F) -> Result<T, RepoError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> Result<T, RepoError>,
    {
        self.run_with_lock(lock_key, || async {
            let current = self.read(path).await?;
            let next = apply(current)?;
            self.write_within_lock(path, &next).await?;
            Ok(next)
        })
        .await
    }
}

/// Make sure the directory the document goes into exists.
async fn prepare_target(path: &Path) -> Result<(), RepoError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RepoError::io("create_dir", format!("{}: {}", parent.display(), e))),
        _ => Ok(()),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}
