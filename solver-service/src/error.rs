//! Error envelope for the upload pipeline.
//!
//! Every failure is rendered as `{"error": "<message>"}`. Client-correctable
//! problems (missing/invalid upload, unreadable or textless PDF) are 400;
//! everything attributable to the answer generator or to the service itself
//! is 500.

use crate::models::SolutionsError;
use crate::services::extractor::ExtractError;
use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Invalid file format, only PDFs allowed")]
    InvalidFormat,

    #[error("Failed to read uploaded file: {0}")]
    UnreadableUpload(String),

    #[error("{0}")]
    Extraction(String),

    #[error("No text could be extracted from the PDF")]
    NoText,

    #[error("{0}")]
    Upstream(String),

    #[error("No content returned from Gemini API")]
    NoContent,

    #[error("Invalid JSON format from Gemini API: {0}")]
    InvalidJson(String),

    #[error("Invalid solutions format from Gemini API")]
    InvalidSolutions,

    #[error("{0}")]
    Internal(String),
}

impl SolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            SolveError::NoFileUploaded
            | SolveError::NoFileSelected
            | SolveError::InvalidFormat
            | SolveError::UnreadableUpload(_)
            | SolveError::Extraction(_)
            | SolveError::NoText => StatusCode::BAD_REQUEST,
            SolveError::Upstream(_)
            | SolveError::NoContent
            | SolveError::InvalidJson(_)
            | SolveError::InvalidSolutions
            | SolveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for the `outcome` metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            SolveError::NoFileUploaded
            | SolveError::NoFileSelected
            | SolveError::InvalidFormat
            | SolveError::UnreadableUpload(_) => "rejected",
            SolveError::Extraction(_) | SolveError::NoText => "extraction_failed",
            SolveError::Upstream(_) => "upstream_failed",
            SolveError::NoContent | SolveError::InvalidJson(_) | SolveError::InvalidSolutions => {
                "invalid_answer"
            }
            SolveError::Internal(_) => "internal_error",
        }
    }
}

impl From<ExtractError> for SolveError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Unreadable(_) => SolveError::Extraction(err.to_string()),
            ExtractError::Crashed(message) => SolveError::Internal(message),
        }
    }
}

impl From<ProviderError> for SolveError {
    fn from(err: ProviderError) -> Self {
        SolveError::Upstream(err.to_string())
    }
}

impl From<SolutionsError> for SolveError {
    fn from(err: SolutionsError) -> Self {
        match err {
            SolutionsError::InvalidJson(message) => SolveError::InvalidJson(message),
            SolutionsError::InvalidShape => SolveError::InvalidSolutions,
        }
    }
}

impl From<std::io::Error> for SolveError {
    fn from(err: std::io::Error) -> Self {
        SolveError::Internal(err.to_string())
    }
}

impl IntoResponse for SolveError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Recover the message of a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Last-resort handler for panics escaping a request handler.
pub(crate) fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload);
    tracing::error!(error = %message, "Request handler panicked");
    SolveError::Internal(message).into_response()
}
