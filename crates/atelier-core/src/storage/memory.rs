//! In-process object store for local development and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::ObjectStore;
use crate::error::StorageError;

/// An object held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Object store backed by a map, with optional per-bucket write failures.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    failing_buckets: Mutex<HashSet<String>>,
    upload_attempts: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `bucket` fail.
    pub fn fail_writes_to(&self, bucket: &str) {
        self.failing_buckets.lock().insert(bucket.to_string());
    }

    /// Fetch a stored object.
    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys stored in `bucket`.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Every `(bucket, key)` a write was attempted for, successful or not.
    pub fn upload_attempts(&self) -> Vec<(String, String)> {
        self.upload_attempts.lock().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.upload_attempts
            .lock()
            .push((bucket.to_string(), key.to_string()));

        if self.failing_buckets.lock().contains(bucket) {
            return Err(StorageError::Injected(bucket.to_string()));
        }

        let mut objects = self.objects.lock();
        let id = (bucket.to_string(), key.to_string());
        if objects.contains_key(&id) {
            return Err(StorageError::Http {
                status: 409,
                message: format!("The resource already exists: {bucket}/{key}"),
            });
        }
        objects.insert(
            id,
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{bucket}/{key}")
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
