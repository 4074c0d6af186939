//! Sub-configuration structs with production defaults.

use serde::{Deserialize, Serialize};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Maximum accepted request body in megabytes (covers batch uploads)
    pub body_limit_mb: u64,

    /// Origins allowed by CORS; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            body_limit_mb: 100,
            cors_origins: vec![],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum decoded image dimension (width or height)
    pub max_image_dimension: u32,

    /// Transcode timeout in milliseconds
    pub transcode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            max_image_dimension: 12000,
            transcode_timeout_ms: 30000,
        }
    }
}

impl LimitsConfig {
    /// Maximum file size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// One row of the upload allow-list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowedType {
    /// Declared MIME type, e.g. "image/jpeg"
    pub mime_type: String,

    /// Filename extensions accepted for this type, with leading dot
    pub extensions: Vec<String>,
}

/// Upload acceptance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Accepted `{mime_type, extensions}` pairs
    pub allowed_types: Vec<AllowedType>,

    /// Maximum length of the sanitized base filename
    pub max_filename_length: usize,

    /// Reject files whose leading bytes are not a known image signature
    pub check_signature: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_types: vec![
                AllowedType {
                    mime_type: "image/jpeg".to_string(),
                    extensions: vec![".jpg".to_string(), ".jpeg".to_string()],
                },
                AllowedType {
                    mime_type: "image/png".to_string(),
                    extensions: vec![".png".to_string()],
                },
            ],
            max_filename_length: 50,
            check_signature: true,
        }
    }
}

/// Image transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Images wider than this are downscaled to exactly this width
    pub max_width: u32,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_width: 2000,
            quality: 80,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Supabase Storage REST API
    #[default]
    Supabase,
    /// In-process store, for local development
    Memory,
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which backend to use
    pub backend: StorageBackend,

    /// Supabase project URL (supports ${ENV_VAR} syntax)
    pub url: String,

    /// Service role key (supports ${ENV_VAR} syntax)
    pub service_key: String,

    /// Public bucket receiving optimized images
    pub optimized_bucket: String,

    /// Private bucket receiving untouched originals
    pub original_bucket: String,

    /// Cache-Control max-age sent with uploads, in seconds
    pub cache_control_secs: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Supabase,
            url: "${SUPABASE_URL}".to_string(),
            service_key: "${SUPABASE_SERVICE_ROLE_KEY}".to_string(),
            optimized_bucket: "portfolio-images".to_string(),
            original_bucket: "portfolio-originals".to_string(),
            cache_control_secs: 3600,
        }
    }
}

/// Per-client request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether requests are rate limited at all
    pub enabled: bool,

    /// Requests allowed per client within one window
    pub max_requests: u32,

    /// Sliding window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 10,
            window_secs: 60,
        }
    }
}

/// Batch upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum files transcoded and stored concurrently
    pub parallel: usize,

    /// Maximum files accepted in one batch request
    pub max_files: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: 4,
            max_files: 20,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
