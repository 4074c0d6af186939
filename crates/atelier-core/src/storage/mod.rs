//! Object storage backends.
//!
//! The pipeline only sees [`ObjectStore`]; the backend is picked from
//! `[storage]` configuration by [`create_store`].

mod memory;
mod supabase;

pub use memory::{MemoryStore, StoredObject};
pub use supabase::SupabaseStorage;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{resolve_env_var, StorageBackend, StorageConfig};
use crate::error::{ConfigError, StorageError};

/// Trait that all storage backends implement.
///
/// Uses `async_trait` because the pipeline holds backends as
/// `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging (e.g., "supabase", "memory").
    fn name(&self) -> &str;

    /// Write `data` under `bucket/key`. Existing objects are never overwritten.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// URL under which `bucket/key` is served.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Delete `bucket/key`.
    async fn remove(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// Build the configured storage backend.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, ConfigError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; uploads are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Supabase => {
            let url = resolve_env_var(&config.url).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "storage.url is not set (configured as '{}')",
                    config.url
                ))
            })?;
            let key = resolve_env_var(&config.service_key).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "storage.service_key is not set (configured as '{}')",
                    config.service_key
                ))
            })?;
            Ok(Arc::new(SupabaseStorage::new(
                &url,
                &key,
                config.cache_control_secs,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_memory_store() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        let store = create_store(&config).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn test_create_supabase_store_requires_credentials() {
        let config = StorageConfig {
            url: "${ATELIER_TEST_UNSET_SUPABASE_URL}".into(),
            ..Default::default()
        };
        let err = create_store(&config).err().unwrap();
        assert!(err.to_string().contains("storage.url"));
    }

    #[test]
    fn test_create_supabase_store_with_literal_credentials() {
        let config = StorageConfig {
            url: "https://demo.supabase.co".into(),
            service_key: "service-key".into(),
            ..Default::default()
        };
        let store = create_store(&config).unwrap();
        assert_eq!(store.name(), "supabase");
        assert_eq!(
            store.public_url("portfolio-images", "home/a.jpg"),
            "https://demo.supabase.co/storage/v1/object/public/portfolio-images/home/a.jpg"
        );
    }
}
