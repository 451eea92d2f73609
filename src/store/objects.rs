/// Hosted object store client (storage API)
use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};
use crate::store::ObjectStore;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Object store backed by the hosted backend's storage API
///
/// All blobs live under one well-known bucket. Removal is best-effort by
/// design: callers in the cleanup path log failures and move on.
pub struct StorageObjectStore {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl StorageObjectStore {
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }
}

#[async_trait]
impl ObjectStore for StorageObjectStore {
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> AppResult<()> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .authorize(self.client.post(url))
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::ObjectStore(format!("blob upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ObjectStore(format!(
                "blob upload returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let response = self
            .authorize(self.client.delete(url))
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| AppError::ObjectStore(format!("blob removal failed: {}", e)))?;

        let status = response.status();
        // Removing paths that no longer exist is not a failure; a cleanup
        // re-run must not error on blobs already deleted.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ObjectStore(format!(
                "blob removal returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}
