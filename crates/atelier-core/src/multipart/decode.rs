//! Single-pass multipart body splitter.

use std::sync::OnceLock;

use regex::Regex;

use super::{FilePart, MultipartForm};
use crate::error::UploadError;

const CRLF: &[u8] = b"\r\n";
const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";
const CLOSE_SUFFIX: &[u8] = b"--";

fn boundary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)boundary=(?:"([^"]+)"|([^";\s]+))"#).expect("boundary pattern is valid")
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|[;\s])name="([^"]*)""#).expect("name pattern is valid")
    })
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)filename="([^"]*)""#).expect("filename pattern is valid")
    })
}

/// Extract the boundary token from a `Content-Type` header value.
///
/// The media type must be `multipart/form-data`; the boundary may be quoted
/// or bare.
pub fn extract_boundary(content_type: &str) -> Result<String, UploadError> {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    if !media_type.eq_ignore_ascii_case("multipart/form-data") {
        return Err(UploadError::MalformedRequest(format!(
            "Expected multipart/form-data, got '{media_type}'"
        )));
    }

    let captures = boundary_pattern().captures(content_type).ok_or_else(|| {
        UploadError::MalformedRequest("Missing boundary in Content-Type header".to_string())
    })?;

    let boundary = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    Ok(boundary)
}

/// Decode a multipart body into file parts and text fields.
///
/// Malformed parts (no header/payload separator, no usable disposition) are
/// skipped rather than failing the whole request.
pub fn decode(body: &[u8], content_type: &str) -> Result<MultipartForm, UploadError> {
    let boundary = extract_boundary(content_type)?;
    let delimiter = format!("--{boundary}");

    let mut form = MultipartForm::default();
    for raw in split_parts(body, delimiter.as_bytes()) {
        match parse_part(raw) {
            Some(Part::File(file)) => form.files.push(file),
            Some(Part::Field(name, value)) => {
                form.fields.insert(name, value);
            }
            None => {}
        }
    }

    tracing::trace!(
        files = form.files.len(),
        fields = form.fields.len(),
        "Decoded multipart body"
    );

    Ok(form)
}

enum Part {
    File(FilePart),
    Field(String, String),
}

/// Split `body` on `delimiter`, returning the segments between occurrences.
///
/// The preamble is included. Splitting stops at the close delimiter
/// (`delimiter` followed by `--`); the epilogue after it is discarded. A body
/// without a close delimiter keeps its trailing segment.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut start = 0;
    while let Some(pos) = find(body, delimiter, start) {
        segments.push(&body[start..pos]);
        start = pos + delimiter.len();
        if body[start..].starts_with(CLOSE_SUFFIX) {
            return segments;
        }
    }
    segments.push(&body[start..]);
    segments
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn parse_part(raw: &[u8]) -> Option<Part> {
    let raw = raw.strip_prefix(CRLF).unwrap_or(raw);

    let Some(separator) = find(raw, HEADER_SEPARATOR, 0) else {
        if !raw.trim_ascii().is_empty() {
            tracing::debug!(len = raw.len(), "Skipping multipart part without header separator");
        }
        return None;
    };

    let headers = String::from_utf8_lossy(&raw[..separator]);
    let payload = &raw[separator + HEADER_SEPARATOR.len()..];
    let payload = payload.strip_suffix(CRLF).unwrap_or(payload);

    let mut disposition = None;
    let mut content_type = None;
    for line in headers.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.eq_ignore_ascii_case("content-disposition") {
            disposition = Some(value.trim().to_string());
        } else if name.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let disposition = disposition?;
    let name = name_pattern()
        .captures(&disposition)
        .map(|c| c[1].to_string());
    let filename = filename_pattern()
        .captures(&disposition)
        .map(|c| c[1].to_string());

    match (name, filename, content_type) {
        (name, Some(filename), Some(content_type)) => Some(Part::File(FilePart {
            field_name: name.unwrap_or_default(),
            filename,
            content_type,
            data: payload.to_vec(),
        })),
        (Some(name), _, _) => Some(Part::Field(
            name,
            String::from_utf8_lossy(payload).into_owned(),
        )),
        _ => None,
    }
}
