use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::extraction::error::{LoadFailure, NoTextHint};
use crate::extraction::ExtractionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request body too large: {0}")]
    BodyTooLarge(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM features are not configured")]
    LlmUnavailable,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::BodyTooLarge(e.body_text())
        } else {
            AppError::Validation(format!("invalid multipart body: {}", e.body_text()))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                Value::Null,
            ),
            AppError::BodyTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_TOO_LARGE",
                "The upload exceeds the size limit.".to_string(),
                json!({ "reason": msg }),
            ),
            AppError::Extraction(e) => extraction_response(e),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                    Value::Null,
                )
            }
            AppError::LlmUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "LLM_UNAVAILABLE",
                "AI features are not configured on this server".to_string(),
                Value::Null,
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Value::Null,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if !details.is_null() {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Maps each extraction failure kind to a status, a stable code, a message a
/// user can act on, and machine-readable details.
fn extraction_response(e: &ExtractionError) -> (StatusCode, &'static str, String, Value) {
    match e {
        ExtractionError::InvalidFormat => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "INVALID_FORMAT",
            "The file is not a PDF. Upload a PDF or a plain-text resume.".to_string(),
            Value::Null,
        ),
        ExtractionError::TooLarge { size, limit } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            "FILE_TOO_LARGE",
            format!("The file is {size} bytes; the limit is {limit} bytes."),
            json!({ "size": size, "limit": limit }),
        ),
        ExtractionError::LoadFailed {
            attempts, cause, ..
        } => {
            let message = match cause {
                LoadFailure::Encrypted => {
                    "The PDF is password protected. Remove the protection and upload it again."
                }
                LoadFailure::Corrupt => "The PDF appears to be damaged. Try exporting it again.",
                LoadFailure::Backend => "The PDF could not be opened. Please try again.",
            };
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PDF_LOAD_FAILED",
                message.to_string(),
                json!({ "cause": cause, "attempts": attempts }),
            )
        }
        ExtractionError::EmptyDocument => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "EMPTY_DOCUMENT",
            "The PDF has no pages.".to_string(),
            Value::Null,
        ),
        ExtractionError::NoExtractableText { hint } => {
            let message = match hint {
                NoTextHint::LikelyScanned => {
                    "No text was found. The PDF looks like a scanned image; upload a text-based PDF."
                }
                NoTextHint::LikelyEncrypted => {
                    "No text could be read. The PDF appears to be protected."
                }
                NoTextHint::Unreadable => "No text could be read from any page of the PDF.",
            };
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_EXTRACTABLE_TEXT",
                message.to_string(),
                json!({ "hint": hint }),
            )
        }
        ExtractionError::InsufficientText { chars, minimum } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INSUFFICIENT_TEXT",
            format!("Only {chars} characters of text were found; at least {minimum} are needed."),
            json!({ "chars": chars, "minimum": minimum }),
        ),
        ExtractionError::Cancelled => (
            // 499: client closed request (nginx convention).
            StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            "REQUEST_CANCELLED",
            "The request was cancelled.".to_string(),
            Value::Null,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_too_large_maps_to_413_with_details() {
        let (status, body) = render(AppError::from(ExtractionError::TooLarge {
            size: 20,
            limit: 10,
        }))
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "FILE_TOO_LARGE");
        assert_eq!(body["error"]["details"]["limit"], 10);
    }

    #[tokio::test]
    async fn test_scanned_hint_is_exposed() {
        let (status, body) = render(AppError::from(ExtractionError::NoExtractableText {
            hint: NoTextHint::LikelyScanned,
        }))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "NO_EXTRACTABLE_TEXT");
        assert_eq!(body["error"]["details"]["hint"], "likely_scanned");
    }

    #[tokio::test]
    async fn test_load_failure_cause_is_exposed() {
        let (_, body) = render(AppError::from(ExtractionError::LoadFailed {
            attempts: 1,
            cause: LoadFailure::Encrypted,
            detail: "password required".to_string(),
        }))
        .await;
        assert_eq!(body["error"]["code"], "PDF_LOAD_FAILED");
        assert_eq!(body["error"]["details"]["cause"], "encrypted");
        assert!(!body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("password required"));
    }

    #[tokio::test]
    async fn test_validation_has_no_details() {
        let (status, body) = render(AppError::Validation("missing file".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].get("details").is_none());
    }
}
