//! Data types returned by the upload pipeline.
//!
//! These serialize with camelCase keys, which is the shape the portfolio
//! front end reads.

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// The result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Public URL of the optimized image
    pub optimized_url: String,

    /// URL of the preserved original, when one was requested and stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,

    /// Storage key of the optimized image within its bucket
    pub optimized_path: String,

    /// Storage key of the original within its bucket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,

    /// Stored filename of the optimized image
    pub filename: String,

    /// Optimized width in pixels
    pub width: u32,

    /// Optimized height in pixels
    pub height: u32,

    /// Optimized size in bytes
    pub size: u64,
}

/// One file that failed within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    /// Client-supplied filename
    pub filename: String,

    /// Short error title
    pub error: String,

    /// Full error message
    pub details: String,
}

impl BatchFailure {
    pub fn new(filename: String, error: &UploadError) -> Self {
        Self {
            filename,
            error: error.title().to_string(),
            details: error.to_string(),
        }
    }
}

/// Partitioned results of a batch upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub succeeded: Vec<UploadOutcome>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// True when no file failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
