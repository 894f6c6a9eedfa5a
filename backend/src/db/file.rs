use async_trait::async_trait;
use serde_json::Value;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::{DocumentStore, StoreError};

const BACKUP_SUFFIX: &str = "backup";

/// Stores each document as `<root>/<key>.json`.
///
/// The previous version of a document is copied to `<key>.json.backup` before it is
/// replaced, and new content is written to a temporary file and renamed into place.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut raw = path.as_os_str().to_owned();
        raw.push(format!(".{}", BACKUP_SUFFIX));
        PathBuf::from(raw)
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, key: &str) -> Result<Value, StoreError> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Value::Null),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(key, path = %path.display(), error = %err, "Corrupt document ignored");
                Ok(Value::Null)
            }
        }
    }

    async fn save(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::try_exists(&path).await? {
            tokio::fs::copy(&path, Self::backup_path(&path)).await?;
        }

        let body = serde_json::to_vec_pretty(document)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
