//! Answer generator abstractions and implementations.
//!
//! The handler only sees [`TextProvider`]; the Gemini client is the production
//! implementation and [`mock::MockTextProvider`] serves tests and offline runs.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Message relayed when the upstream error body carries no message of its own.
pub const GENERIC_UPSTREAM_FAILURE: &str = "Gemini API request failed";

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Non-success HTTP status. `message` is the upstream's own error text.
    #[error("{message}")]
    ApiError { status: u16, message: String },

    #[error("{0}")]
    NetworkError(String),

    #[error("Failed to parse Gemini response: {0}")]
    InvalidResponse(String),
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text of the first candidate, if any.
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    /// Finish reason.
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            Some("STOP") | None => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => FinishReason::ContentFilter,
            Some(_) => FinishReason::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other => "other",
        }
    }
}

/// Generation parameters for a single request.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Ask for `application/json` output.
    pub json_output: bool,
}

impl GenerationParams {
    pub fn json() -> Self {
        Self { json_output: true }
    }
}

/// Trait for text/JSON generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Send one prompt and wait for the complete answer.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;
}
