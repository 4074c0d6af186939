//! Supabase Storage backend using the Storage REST API.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::Serialize;

use super::ObjectStore;
use crate::error::StorageError;

/// Supabase Storage client authenticated with a service role key.
pub struct SupabaseStorage {
    base_url: String,
    service_key: String,
    cache_control: String,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str, cache_control_secs: u32) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            cache_control: format!("max-age={cache_control_secs}"),
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{key}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: [&'a str; 1],
}

async fn error_from(response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    StorageError::Http { status, message }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = data.len();
        let response = self
            .authorized(self.client.post(self.object_url(bucket, key)))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, &self.cache_control)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        tracing::debug!(bucket, key, size, "Stored object in Supabase");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.base_url)
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let response = self
            .authorized(
                self.client
                    .delete(format!("{}/storage/v1/object/{bucket}", self.base_url)),
            )
            .json(&RemoveRequest { prefixes: [key] })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        // The API answers 200 with the list of objects it actually deleted.
        let deleted: Vec<serde_json::Value> = response.json().await?;
        if deleted.is_empty() {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        tracing::debug!(bucket, key, "Removed object from Supabase");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_trim_trailing_slash() {
        let storage = SupabaseStorage::new("https://demo.supabase.co/", "key", 3600);
        assert_eq!(
            storage.object_url("portfolio-originals", "about/me_1_abc123.png"),
            "https://demo.supabase.co/storage/v1/object/portfolio-originals/about/me_1_abc123.png"
        );
        assert_eq!(
            storage.public_url("portfolio-images", "about/me_1_abc123.jpg"),
            "https://demo.supabase.co/storage/v1/object/public/portfolio-images/about/me_1_abc123.jpg"
        );
    }

    #[test]
    fn test_cache_control_header_value() {
        let storage = SupabaseStorage::new("https://demo.supabase.co", "key", 600);
        assert_eq!(storage.cache_control, "max-age=600");
    }

    #[test]
    fn test_remove_request_shape() {
        let body = serde_json::to_value(RemoveRequest {
            prefixes: ["home/a.jpg"],
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "prefixes": ["home/a.jpg"] }));
    }
}
