//! Storage-safe, collision-free filenames derived from client filenames.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Characters rejected by common filesystems.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Length of the random suffix appended to every stored name.
const SUFFIX_LEN: usize = 6;

/// Used when nothing usable survives sanitization.
const FALLBACK_NAME: &str = "image";

/// Reduce a client filename to a bare, harmless file name.
///
/// Drops directory components (either separator), control characters and
/// filesystem-forbidden characters. A final segment made only of dots (`.`,
/// `..`) is a path reference, not a name, and sanitizes to `""`. Dots inside
/// a name are kept, as is the extension.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control() && !FORBIDDEN.contains(c))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.chars().all(|c| c == '.') {
        return String::new();
    }
    cleaned.to_string()
}

/// Lowercased extension with its leading dot, or `""`.
pub fn original_extension(name: &str) -> String {
    Path::new(&sanitize_filename(name))
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// The storage base name: no extension, only `[A-Za-z0-9_-]`, at most
/// `max_len` characters.
pub fn base_name(name: &str, max_len: usize) -> String {
    let sanitized = sanitize_filename(name);
    let stem = match sanitized.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => sanitized.as_str(),
    };

    let base: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if base.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        base
    }
}

/// Produces unique storage names for uploads.
#[derive(Debug, Clone)]
pub struct FilenameGenerator {
    max_len: usize,
}

impl FilenameGenerator {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// `{base}_{unix_millis}_{random}`, without extension.
    ///
    /// The random suffix keeps names distinct when two uploads of the same
    /// file land in the same millisecond.
    pub fn unique_name(&self, original: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();

        format!("{}_{millis}_{suffix}", base_name(original, self.max_len))
    }
}
