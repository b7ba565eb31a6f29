//! In-memory object store, used by tests and throwaway deployments

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ObjectAccess, ObjectStore, StorageError, UrlSigner, validate_key};

pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    signer: Arc<UrlSigner>,
}

impl MemoryObjectStore {
    pub fn new(signer: Arc<UrlSigner>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            signer,
        }
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        validate_key(key)?;
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
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
