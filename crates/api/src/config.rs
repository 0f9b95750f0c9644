use std::path::PathBuf;
use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Uploads that need
    /// transcoding can take minutes.
    pub request_timeout_secs: u64,
    /// Largest accepted upload body in megabytes (default: `100`).
    pub max_upload_mb: usize,
    /// Requests allowed per client per minute; `0` disables limiting (default: `100`).
    pub rate_limit_per_minute: u32,
    /// JWT signing configuration.
    pub jwt: JwtConfig,
    /// Media pipeline settings.
    pub media: MediaConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `HOST`                  | `0.0.0.0`                |
    /// | `PORT`                  | `8080`                   |
    /// | `CORS_ORIGINS`          | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS`  | `300`                    |
    /// | `MAX_UPLOAD_MB`         | `100`                    |
    /// | `RATE_LIMIT_PER_MINUTE` | `100`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_mb: usize = std::env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("MAX_UPLOAD_MB must be a valid usize");

        let rate_limit_per_minute: u32 = std::env::var("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("RATE_LIMIT_PER_MINUTE must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_mb,
            rate_limit_per_minute,
            jwt: JwtConfig::from_env(),
            media: MediaConfig::from_env(),
        }
    }

    /// Upload body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Settings for the media ingestion pipeline.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Parent directory for per-upload scratch directories.
    pub scratch_dir: PathBuf,
    /// Upper bound on each external tool invocation.
    pub tool_timeout: Duration,
}

impl MediaConfig {
    /// | Env Var                   | Default             |
    /// |---------------------------|---------------------|
    /// | `MEDIA_SCRATCH_DIR`       | system temp dir     |
    /// | `MEDIA_TOOL_TIMEOUT_SECS` | `120`               |
    pub fn from_env() -> Self {
        let scratch_dir = std::env::var("MEDIA_SCRATCH_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let tool_timeout_secs: u64 = std::env::var("MEDIA_TOOL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("MEDIA_TOOL_TIMEOUT_SECS must be a valid u64");

        Self {
            scratch_dir,
            tool_timeout: Duration::from_secs(tool_timeout_secs),
        }
    }
}
