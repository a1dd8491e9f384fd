use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The template for a document type is missing on disk. Deployment fault.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::TemplateMissing(path) => {
                AppError::TemplateNotFound(path.display().to_string())
            }
            storage @ RenderError::Storage { .. } => AppError::Storage(storage.to_string()),
            other => AppError::Render(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::TemplateNotFound(path) => {
                tracing::error!("Template not found: {path}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TEMPLATE_NOT_FOUND",
                    "The document template is not available on the server".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "The document template could not be rendered".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_template_maps_to_server_fault() {
        let err = AppError::from(RenderError::TemplateMissing(PathBuf::from(
            "templates/offer_letter_template.docx",
        )));
        assert!(matches!(err, AppError::TemplateNotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_failure_maps_to_storage_error() {
        let err = AppError::from(RenderError::Storage {
            path: PathBuf::from("generated/x.docx"),
            reason: "read-only file system".to_string(),
        });
        match err {
            AppError::Storage(msg) => assert!(msg.contains("read-only file system")),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found_is_client_error() {
        let response = AppError::NotFound("nope.docx".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_malformed_package_maps_to_render_error() {
        let err = AppError::from(RenderError::MissingPart("word/document.xml".to_string()));
        assert!(matches!(err, AppError::Render(_)));
    }
}
