//! `multipart/form-data` request bodies.
//!
//! - **decode**: split a raw body into file parts and text fields
//! - **encode**: build a body from parts (the inverse of `decode`)

mod decode;
mod encode;

pub use decode::{decode, extract_boundary};
pub use encode::{content_type_for, encode};

use std::collections::HashMap;

/// Field name the upload endpoints look for first.
pub const UPLOAD_FIELD: &str = "file";

/// A part carrying a file payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// The `name` attribute of the part (empty if absent)
    pub field_name: String,
    /// The client-supplied `filename` attribute, unsanitized
    pub filename: String,
    /// The part's declared `Content-Type`
    pub content_type: String,
    /// Payload bytes, exactly as sent
    pub data: Vec<u8>,
}

/// A decoded multipart body.
///
/// Files keep the order they appeared in; fields are keyed by name with the
/// last occurrence winning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub files: Vec<FilePart>,
    pub fields: HashMap<String, String>,
}

impl MultipartForm {
    /// First file part with the given field name.
    pub fn file(&self, field_name: &str) -> Option<&FilePart> {
        self.files.iter().find(|f| f.field_name == field_name)
    }

    /// Text value of a field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether a field carries the literal string `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.field(name) == Some("true")
    }

    /// Remove and return the file to upload: the `file` part, or failing
    /// that the first file part in the body.
    pub fn take_upload_file(&mut self) -> Option<FilePart> {
        if self.files.is_empty() {
            return None;
        }
        let index = self
            .files
            .iter()
            .position(|f| f.field_name == UPLOAD_FIELD)
            .unwrap_or(0);
        Some(self.files.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(field_name: &str, filename: &str) -> FilePart {
        FilePart {
            field_name: field_name.to_string(),
            filename: filename.to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_take_upload_file_prefers_file_field() {
        let mut form = MultipartForm {
            files: vec![part("cover", "a.png"), part("file", "b.png")],
            fields: HashMap::new(),
        };
        let taken = form.take_upload_file().unwrap();
        assert_eq!(taken.filename, "b.png");
        assert_eq!(form.files.len(), 1);
    }

    #[test]
    fn test_take_upload_file_falls_back_to_first() {
        let mut form = MultipartForm {
            files: vec![part("cover", "a.png"), part("extra", "b.png")],
            fields: HashMap::new(),
        };
        assert_eq!(form.take_upload_file().unwrap().filename, "a.png");
        assert!(MultipartForm::default().take_upload_file().is_none());
    }

    #[test]
    fn test_flag_requires_literal_true() {
        let mut form = MultipartForm::default();
        form.fields.insert("keepOriginal".into(), "true".into());
        form.fields.insert("other".into(), "TRUE".into());
        assert!(form.flag("keepOriginal"));
        assert!(!form.flag("other"));
        assert!(!form.flag("missing"));
    }
}
