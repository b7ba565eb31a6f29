//! Filesystem object store
//!
//! Objects live as plain files under a root directory, one file per key.
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never sees a half-written object.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{ObjectAccess, ObjectStore, StorageError, UrlSigner, validate_key};

pub struct FsObjectStore {
    root: PathBuf,
    signer: Arc<UrlSigner>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, signer: Arc<UrlSigner>) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        tokio::fs::create_dir_all(parent).await?;

        let staging = parent.join(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&staging, &bytes).await?;
        if let Err(err) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err.into());
        }

        tracing::debug!("Stored object {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn presign_upload(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(self.signer.sign(key, ObjectAccess::Write)?)
    }

    fn presign_download(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(self.signer.sign(key, ObjectAccess::Read)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store(root: &std::path::Path) -> FsObjectStore {
        let signer = UrlSigner::new("secret", "http://localhost:8080", Duration::from_secs(60));
        FsObjectStore::new(root, Arc::new(signer))
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        store
            .put("users/alice/jobs/1/output.png", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(
            store.get("users/alice/jobs/1/output.png").await.unwrap(),
            vec![1, 2, 3]
        );
        assert!(store.exists("users/alice/jobs/1/output.png").await.unwrap());
        assert!(tmp.path().join("users/alice/jobs/1/output.png").is_file());
    }

    #[tokio::test]
    async fn test_put_replaces_existing_object() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        store.put("seed/seed.png", vec![1]).await.unwrap();
        store.put("seed/seed.png", vec![2, 2]).await.unwrap();

        assert_eq!(store.get("seed/seed.png").await.unwrap(), vec![2, 2]);
        let leftovers = std::fs::read_dir(tmp.path().join("seed")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        assert!(matches!(
            store.get("users/alice/jobs/1/input").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(!store.exists("users/alice/jobs/1/input").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_key_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        assert!(matches!(
            store.put("../escape", vec![0]).await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.presign_download("../escape").is_err());
    }
}
