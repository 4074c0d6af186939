//! Upload validation before any processing or I/O.

use crate::config::{AllowedType, LimitsConfig, UploadConfig};
use crate::error::{UploadError, UploadResult, ValidationRule};

use super::filename::original_extension;

/// Validates uploads against the configured allow-list and limits.
///
/// A single table of `{mime_type, extensions}` rows drives both the MIME
/// type and the extension checks.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: u64,
    allowed: Vec<AllowedType>,
    check_signature: bool,
}

/// Strip parameters and normalize case: `"Image/JPEG; q=1"` → `"image/jpeg"`.
pub(crate) fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl UploadPolicy {
    /// Create a new policy from limits and upload settings.
    pub fn new(limits: &LimitsConfig, upload: &UploadConfig) -> Self {
        Self {
            max_bytes: limits.max_file_size_bytes(),
            allowed: upload.allowed_types.clone(),
            check_signature: upload.check_signature,
        }
    }

    /// Run every check in order, stopping at the first failure.
    ///
    /// Checks:
    /// - byte length is non-zero and within the limit
    /// - declared MIME type is allowed
    /// - filename extension is allowed
    /// - leading bytes match the declared type's signature
    pub fn validate(&self, filename: &str, content_type: &str, data: &[u8]) -> UploadResult<()> {
        self.check_size(data.len() as u64)?;
        let mime = self.check_type(content_type)?;
        self.check_extension(filename)?;
        if self.check_signature {
            Self::check_signature(&mime, data)?;
        }
        Ok(())
    }

    /// Check a byte length against the size rule alone.
    pub fn check_size(&self, len: u64) -> UploadResult<()> {
        if len == 0 {
            return Err(UploadError::validation(ValidationRule::Size, "File is empty"));
        }
        if len > self.max_bytes {
            return Err(UploadError::validation(
                ValidationRule::Size,
                format!(
                    "File is {:.1}MB, the limit is {}MB",
                    len as f64 / (1024.0 * 1024.0),
                    self.max_bytes / (1024 * 1024)
                ),
            ));
        }
        Ok(())
    }

    fn check_type(&self, content_type: &str) -> UploadResult<String> {
        let mime = normalize_mime(content_type);
        if self.allowed.iter().any(|t| t.mime_type == mime) {
            Ok(mime)
        } else {
            Err(UploadError::validation(
                ValidationRule::Type,
                format!(
                    "Type '{}' is not allowed (allowed: {})",
                    content_type,
                    self.allowed_mime_types().join(", ")
                ),
            ))
        }
    }

    fn check_extension(&self, filename: &str) -> UploadResult<()> {
        let ext = original_extension(filename);
        if self.is_allowed_extension(&ext) {
            return Ok(());
        }
        let shown = if ext.is_empty() { "(none)" } else { ext.as_str() };
        Err(UploadError::validation(
            ValidationRule::Extension,
            format!(
                "Extension '{}' is not allowed (allowed: {})",
                shown,
                self.allowed_extensions().join(", ")
            ),
        ))
    }

    fn check_signature(mime: &str, data: &[u8]) -> UploadResult<()> {
        let matches = match mime {
            "image/jpeg" => is_jpeg(data),
            "image/png" => is_png(data),
            // No known signature for this type; trust the decoder.
            _ => true,
        };
        if matches {
            Ok(())
        } else {
            Err(UploadError::validation(
                ValidationRule::Signature,
                format!("File content is not a valid {mime} image"),
            ))
        }
    }

    /// Whether `ext` (with leading dot, any case) is in the allow-list.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        !ext.is_empty()
            && self
                .allowed
                .iter()
                .flat_map(|t| t.extensions.iter())
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    /// MIME type registered for an extension, if allowed.
    pub fn mime_for_extension(&self, ext: &str) -> Option<&str> {
        self.allowed
            .iter()
            .find(|t| t.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .map(|t| t.mime_type.as_str())
    }

    pub fn allowed_mime_types(&self) -> Vec<&str> {
        self.allowed.iter().map(|t| t.mime_type.as_str()).collect()
    }

    pub fn allowed_extensions(&self) -> Vec<&str> {
        self.allowed
            .iter()
            .flat_map(|t| t.extensions.iter().map(String::as_str))
            .collect()
    }
}

/// JPEG: FF D8 FF
fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
}

/// PNG: 89 50 4E 47 0D 0A 1A 0A
fn is_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}
