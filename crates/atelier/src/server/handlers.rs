//! Route handlers.
//!
//! Endpoints:
//! - POST /api/upload - upload one image
//! - POST /api/upload/batch - upload every file part in the body
//! - DELETE /api/images - delete a stored image (and its original)
//! - GET /health - liveness

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Method},
    Json,
};
use serde::{Deserialize, Serialize};

use atelier_core::multipart::{self, MultipartForm};
use atelier_core::{
    BatchOutcome, PageFolder, StorageTarget, UploadError, UploadOutcome, UploadRequest,
    ValidationRule,
};

use super::error::ApiError;
use super::state::AppState;

/// Used when no client address can be determined.
const ANONYMOUS_CLIENT: &str = "anonymous";

/// `{ success, data }`
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub optimized_path: String,
    #[serde(default)]
    pub original_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub removed: Vec<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: atelier_core::VERSION,
    })
}

/// POST /api/upload
pub async fn upload(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<UploadOutcome>>, ApiError> {
    state.admit(&client_id(&headers, connect.as_ref())).await?;

    let mut form = decode_form(&headers, &body)?;
    let folder = PageFolder::resolve(form.field("page"), form.field("section"))?;
    let keep_original = form.flag("keepOriginal");
    let file = form
        .take_upload_file()
        .ok_or_else(|| UploadError::validation(ValidationRule::File, "No file was uploaded"))?;

    let outcome = state
        .pipeline()
        .upload(UploadRequest {
            file,
            folder,
            keep_original,
        })
        .await?;

    Ok(Json(ApiResponse {
        success: true,
        data: outcome,
    }))
}

/// POST /api/upload/batch
///
/// Responds 200 even when some files failed; `success` is false then.
pub async fn upload_batch(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<BatchOutcome>>, ApiError> {
    state.admit(&client_id(&headers, connect.as_ref())).await?;

    let form = decode_form(&headers, &body)?;
    let folder = PageFolder::resolve(form.field("page"), form.field("section"))?;
    let keep_original = form.flag("keepOriginal");
    let requests = form
        .files
        .into_iter()
        .map(|file| UploadRequest {
            file,
            folder,
            keep_original,
        })
        .collect();

    let outcome = state.pipeline().upload_batch(requests).await?;
    Ok(Json(ApiResponse {
        success: outcome.is_complete(),
        data: outcome,
    }))
}

/// DELETE /api/images
pub async fn delete_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<DeleteOutcome>>, ApiError> {
    let request: DeleteRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;
    check_storage_path(&request.optimized_path)?;
    if let Some(path) = &request.original_path {
        check_storage_path(path)?;
    }

    let mut removed = Vec::new();
    state
        .pipeline()
        .remove(StorageTarget::Optimized, &request.optimized_path)
        .await?;
    removed.push(request.optimized_path);

    if let Some(path) = request.original_path {
        // The optimized copy is already gone; a missing original is not an error.
        match state.pipeline().remove(StorageTarget::Original, &path).await {
            Ok(()) => removed.push(path),
            Err(e) => tracing::warn!(path = %path, error = %e, "Original not removed"),
        }
    }

    Ok(Json(ApiResponse {
        success: true,
        data: DeleteOutcome { removed },
    }))
}

/// Any method a route does not serve.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

fn decode_form(headers: &HeaderMap, body: &[u8]) -> Result<MultipartForm, UploadError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    multipart::decode(body, content_type)
}

fn check_storage_path(path: &str) -> Result<(), ApiError> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|seg| seg == "..") {
        return Err(ApiError::BadRequest(format!("Invalid storage path '{path}'")));
    }
    Ok(())
}

/// Identify the caller for rate limiting.
///
/// Prefers the first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer address.
pub fn client_id(headers: &HeaderMap, connect: Option<&ConnectInfo<SocketAddr>>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| connect.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_id_precedence() {
        let peer = ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 5555)));

        let mut headers = HeaderMap::new();
        assert_eq!(client_id(&headers, None), "anonymous");
        assert_eq!(client_id(&headers, Some(&peer)), "10.0.0.7");

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_id(&headers, Some(&peer)), "198.51.100.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_id(&headers, Some(&peer)), "203.0.113.9");
    }

    #[test]
    fn test_check_storage_path() {
        assert!(check_storage_path("home/a_1_abc.jpg").is_ok());
        assert!(check_storage_path("").is_err());
        assert!(check_storage_path("/home/a.jpg").is_err());
        assert!(check_storage_path("home/../secrets").is_err());
    }
}
