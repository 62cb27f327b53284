use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::assistant::AssistantError;
use crate::draft::StorageError;
use crate::export::ExportError;
use crate::wizard::WizardError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Select a template before exporting")]
    TemplateNotSelected,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Export timed out")]
    ExportTimedOut,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WizardError> for AppError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::TemplateNotSelected => AppError::TemplateNotSelected,
            WizardError::InvalidStep(i) => {
                AppError::Validation(format!("Step index {i} is out of range"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::TemplateNotSelected => (
                StatusCode::CONFLICT,
                "TEMPLATE_NOT_SELECTED",
                "Select a template before exporting".to_string(),
            ),
            AppError::Storage(StorageError::StorageFull) => (
                StatusCode::INSUFFICIENT_STORAGE,
                "STORAGE_FULL",
                "Local storage is full. Free up space and save again".to_string(),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Saving the draft failed".to_string(),
                )
            }
            AppError::Assistant(AssistantError::Timeout) => (
                StatusCode::GATEWAY_TIMEOUT,
                "ASSISTANT_TIMEOUT",
                "The assistant timed out. Retry, or continue editing manually".to_string(),
            ),
            AppError::Assistant(e) => {
                tracing::warn!("Assistant error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ASSISTANT_UNAVAILABLE",
                    "The assistant is unavailable. Continue editing manually and retry later"
                        .to_string(),
                )
            }
            AppError::Export(ExportError::UnsupportedFormat(format)) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FORMAT",
                format!("Unsupported export format: {format}"),
            ),
            AppError::Export(ExportError::RenderTreeEmpty) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "RENDER_TREE_EMPTY",
                "The document has no content to export".to_string(),
            ),
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    "Exporting the document failed".to_string(),
                )
            }
            AppError::ExportTimedOut => (
                StatusCode::GATEWAY_TIMEOUT,
                "EXPORT_TIMEOUT",
                "The export took too long. Try again".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
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
