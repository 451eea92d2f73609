/// Configuration management for the Evermore backend
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Hosted record/object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend
    pub service_url: String,
    /// Administrative credential for record and object store access
    pub service_role_key: String,
    /// Well-known bucket holding all blobs for this application
    pub bucket: String,
    /// Per-call timeout for both store clients, in seconds
    pub request_timeout_secs: u64,
    /// How often the cleanup job runs, in seconds
    pub cleanup_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// The hosted backend endpoint and its service-role credential are
    /// required; their absence is startup-fatal rather than a per-run error.
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("EVERMORE_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("EVERMORE_PORT")
            .unwrap_or_else(|_| "8787".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let version = env::var("EVERMORE_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let service_url = env::var("SUPABASE_URL")
            .map_err(|_| AppError::Validation("SUPABASE_URL required".to_string()))?;
        let service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY").map_err(|_| {
            AppError::Validation("SUPABASE_SERVICE_ROLE_KEY required".to_string())
        })?;

        let bucket = env::var("EVERMORE_STORAGE_BUCKET")
            .unwrap_or_else(|_| "response-photos".to_string());
        let request_timeout_secs = env::var("EVERMORE_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let cleanup_interval_secs = env::var("EVERMORE_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            backend: BackendConfig {
                service_url,
                service_role_key,
                bucket,
                request_timeout_secs,
                cleanup_interval_secs,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.backend.service_url.is_empty() {
            return Err(AppError::Validation(
                "Backend service URL cannot be empty".to_string(),
            ));
        }

        if self.backend.service_role_key.is_empty() {
            return Err(AppError::Validation(
                "Backend service role key cannot be empty".to_string(),
            ));
        }

        if self.backend.bucket.is_empty() {
            return Err(AppError::Validation(
                "Storage bucket cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
