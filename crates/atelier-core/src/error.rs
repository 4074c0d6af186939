//! Error types for the Atelier upload pipeline.
//!
//! Errors are organized by concern so that every failure can be reported to
//! the uploader with an HTTP status, a short title, and an actionable detail.

use std::fmt;

use thiserror::Error;

use crate::folders::FolderError;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The validation rule an upload failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// No file part was present in the request
    File,
    /// Too many files in a batch request
    Count,
    /// Byte length is zero or above the configured limit
    Size,
    /// Declared MIME type is not allowed
    Type,
    /// Filename extension is not allowed
    Extension,
    /// Leading bytes do not match an allowed image signature
    Signature,
    /// Decoded image dimensions exceed the configured limit
    Dimensions,
}

impl ValidationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationRule::File => "file",
            ValidationRule::Count => "count",
            ValidationRule::Size => "size",
            ValidationRule::Type => "type",
            ValidationRule::Extension => "extension",
            ValidationRule::Signature => "signature",
            ValidationRule::Dimensions => "dimensions",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which storage destination a write was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTarget {
    Optimized,
    Original,
}

impl fmt::Display for StorageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageTarget::Optimized => f.write_str("optimized"),
            StorageTarget::Original => f.write_str("original"),
        }
    }
}

/// Errors returned by an object store backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage API answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The object does not exist
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// A write failure injected into the in-memory store
    #[error("Writes to bucket '{0}' are disabled")]
    Injected(String),
}

/// Upload pipeline errors, one variant per failure kind.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Body or content type could not be parsed as multipart/form-data
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// A validation rule rejected the file before any processing
    #[error("Validation failed ({rule}): {message}")]
    ValidationFailed {
        rule: ValidationRule,
        message: String,
    },

    /// The requested page/section has no folder mapping
    #[error(transparent)]
    Folder(#[from] FolderError),

    /// A local file could not be read into an upload
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Image decode, resize or encode failed
    #[error("Image processing failed: {message}")]
    TranscodeFailed { message: String },

    /// Writing to object storage failed
    #[error("Failed to store {target} image: {source}")]
    StorageWriteFailed {
        target: StorageTarget,
        #[source]
        source: StorageError,
    },

    /// The client exceeded its request budget
    #[error("Too many requests, retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },
}

impl UploadError {
    /// Shorthand for a validation failure.
    pub fn validation(rule: ValidationRule, message: impl Into<String>) -> Self {
        UploadError::ValidationFailed {
            rule,
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            UploadError::MalformedRequest(_)
            | UploadError::ValidationFailed { .. }
            | UploadError::Folder(_) => 400,
            UploadError::RateLimitExceeded { .. } => 429,
            UploadError::ReadFailed { .. }
            | UploadError::TranscodeFailed { .. }
            | UploadError::StorageWriteFailed { .. } => 500,
        }
    }

    /// Short human-readable title used as the `error` field of responses.
    pub fn title(&self) -> &'static str {
        match self {
            UploadError::MalformedRequest(_) => "Malformed request",
            UploadError::ValidationFailed { .. } => "Validation failed",
            UploadError::Folder(_) => "Configuration error",
            UploadError::ReadFailed { .. } => "Read failed",
            UploadError::TranscodeFailed { .. } => "Image processing failed",
            UploadError::StorageWriteFailed { .. } => "Storage upload failed",
            UploadError::RateLimitExceeded { .. } => "Too many requests",
        }
    }

    /// The failed validation rule, if this is a validation error.
    pub fn rule(&self) -> Option<ValidationRule> {
        match self {
            UploadError::ValidationFailed { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

/// Convenience type alias for upload-specific results.
pub type UploadResult<T> = std::result::Result<T, UploadError>;
