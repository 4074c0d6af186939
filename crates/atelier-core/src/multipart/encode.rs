//! Multipart body builder.

use super::MultipartForm;

/// `Content-Type` header value announcing `boundary`.
pub fn content_type_for(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Encode a form as a `multipart/form-data` body.
///
/// Fields are written first, sorted by name, followed by files in order.
/// The caller must pick a boundary that does not occur in any payload.
pub fn encode(form: &MultipartForm, boundary: &str) -> Vec<u8> {
    let mut out = Vec::new();

    let mut names: Vec<&String> = form.fields.keys().collect();
    names.sort();
    for name in names {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        out.extend_from_slice(form.fields[name].as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    for file in &form.files {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field_name, file.filename, file.content_type
            )
            .as_bytes(),
        );
        out.extend_from_slice(&file.data);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}
