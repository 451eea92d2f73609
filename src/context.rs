/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    error::AppResult,
    store::{ObjectStore, PostgrestRecordStore, RecordStore, StorageObjectStore},
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub records: Arc<dyn RecordStore>,
    pub objects: Arc<dyn ObjectStore>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        // Validate configuration
        config.validate()?;

        let records = Arc::new(PostgrestRecordStore::new(&config.backend)?);
        let objects = Arc::new(StorageObjectStore::new(&config.backend)?);

        Ok(Self {
            config: Arc::new(config),
            records,
            objects,
        })
    }

    /// Well-known bucket holding all blobs for this application
    pub fn bucket(&self) -> &str {
        &self.config.backend.bucket
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
