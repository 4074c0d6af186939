//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.body_limit_mb == 0 {
            return Err(ConfigError::ValidationError(
                "server.body_limit_mb must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.transcode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.transcode_timeout_ms must be > 0".into(),
            ));
        }
        if self.upload.allowed_types.is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.allowed_types must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .upload
            .allowed_types
            .iter()
            .flat_map(|t| t.extensions.iter())
            .find(|ext| !ext.starts_with('.'))
        {
            return Err(ConfigError::ValidationError(format!(
                "upload.allowed_types extension '{bad}' must start with '.'"
            )));
        }
        if self.upload.max_filename_length == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_filename_length must be > 0".into(),
            ));
        }
        if self.transcode.max_width == 0 {
            return Err(ConfigError::ValidationError(
                "transcode.max_width must be > 0".into(),
            ));
        }
        if self.transcode.quality == 0 || self.transcode.quality > 100 {
            return Err(ConfigError::ValidationError(
                "transcode.quality must be between 1 and 100".into(),
            ));
        }
        if self.storage.optimized_bucket.is_empty() || self.storage.original_bucket.is_empty() {
            return Err(ConfigError::ValidationError(
                "storage bucket names must not be empty".into(),
            ));
        }
        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0)
        {
            return Err(ConfigError::ValidationError(
                "rate_limit.max_requests and rate_limit.window_secs must be > 0".into(),
            ));
        }
        if self.batch.parallel == 0 {
            return Err(ConfigError::ValidationError(
                "batch.parallel must be > 0".into(),
            ));
        }
        if self.batch.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "batch.max_files must be > 0".into(),
            ));
        }
        Ok(())
    }
}
