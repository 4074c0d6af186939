//! JSON error envelope for the HTTP API.

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use atelier_core::{FolderError, StorageError, UploadError};

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// Any failure from the upload pipeline
    Upload(UploadError),

    /// Storage failure outside an upload (deletes)
    Storage(StorageError),

    /// Request body is not what the endpoint expects
    BadRequest(String),

    /// The route exists but not for this method
    MethodNotAllowed(Method),
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        ApiError::Upload(e)
    }
}

impl From<FolderError> for ApiError {
    fn from(e: FolderError) -> Self {
        ApiError::Upload(UploadError::Folder(e))
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

/// `{ success: false, error, details }`
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    details: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::Upload(e) => e.title(),
            ApiError::Storage(StorageError::NotFound { .. }) => "Not found",
            ApiError::Storage(_) => "Storage error",
            ApiError::BadRequest(_) => "Bad request",
            ApiError::MethodNotAllowed(_) => "Method not allowed",
        }
    }

    fn details(&self) -> String {
        match self {
            ApiError::Upload(e) => e.to_string(),
            ApiError::Storage(e) => e.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::MethodNotAllowed(method) => format!("Method {method} is not allowed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.details();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %details, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), %details, "Request rejected");
        }

        let body = Json(ErrorBody {
            success: false,
            error: self.title().to_string(),
            details,
        });

        match self {
            ApiError::Upload(UploadError::RateLimitExceeded { retry_after_secs }) => (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::ValidationRule;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(UploadError::MalformedRequest("no boundary".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(UploadError::validation(ValidationRule::Size, "too big")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(FolderError::UnknownPage("blog".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(UploadError::RateLimitExceeded {
                    retry_after_secs: 3,
                }),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ApiError::from(UploadError::TranscodeFailed {
                    message: "corrupt".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(StorageError::NotFound {
                    bucket: "b".into(),
                    key: "k".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::MethodNotAllowed(Method::GET),
                StatusCode::METHOD_NOT_ALLOWED,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error:?}");
        }
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = ApiError::from(UploadError::RateLimitExceeded {
            retry_after_secs: 42,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
