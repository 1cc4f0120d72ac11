//! 错误响应
//!
//! 网关对外的失败响应固定为 `{success: false, error, message}`。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// 网关错误，每个变体对应一种对外错误标签
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("No file provided")]
    MissingFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Invalid file type")]
    UnsupportedType { supported: String },

    #[error("File too large")]
    TooLarge { max_mb: usize },

    #[error("Encoding error")]
    Encoding,

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Processing error: {0}")]
    Engine(String),
}

pub type OcrResult<T> = Result<T, OcrError>;

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            OcrError::MissingFile => (
                StatusCode::BAD_REQUEST,
                "No file provided",
                "Please upload a file".to_string(),
            ),
            OcrError::EmptyFilename => (
                StatusCode::BAD_REQUEST,
                "No file selected",
                "Please select a file to upload".to_string(),
            ),
            OcrError::UnsupportedType { supported } => (
                StatusCode::BAD_REQUEST,
                "Invalid file type",
                format!("Supported formats: {supported}"),
            ),
            OcrError::TooLarge { max_mb } => (
                StatusCode::BAD_REQUEST,
                "File too large",
                format!("Maximum file size is {max_mb}MB"),
            ),
            OcrError::Encoding => (
                StatusCode::BAD_REQUEST,
                "Encoding error",
                "Unable to decode text file. Please ensure it's UTF-8 encoded.".to_string(),
            ),
            OcrError::Upload(msg) => (
                StatusCode::BAD_REQUEST,
                "Upload error",
                msg.clone(),
            ),
            OcrError::Engine(msg) => {
                // Details stay in the log; the response body is generic
                error!(target: "ocr", error = %msg, "Engine processing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Processing error",
                    "An error occurred while processing the file".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error,
            "message": message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_400() {
        for err in [
            OcrError::MissingFile,
            OcrError::EmptyFilename,
            OcrError::Encoding,
            OcrError::TooLarge { max_mb: 10 },
        ] {
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_engine_error_is_500() {
        let err = OcrError::Engine("connection refused".to_string());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_engine_error_body_omits_internal_detail() {
        let err = OcrError::Engine("dial tcp 10.0.0.3:8884: connection refused".to_string());
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Processing error");
        assert_eq!(body["message"], "An error occurred while processing the file");
        assert!(!String::from_utf8_lossy(&bytes).contains("10.0.0.3"));
    }
}
