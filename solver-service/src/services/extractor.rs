//! PDF text extraction backends.

use crate::config::{ExtractorBackend, ExtractorConfig};
use crate::error::panic_message;
use crate::services::executor::{CommandError, CommandExecutor};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document could not be parsed.
    #[error("Failed to extract text from PDF: {0}")]
    Unreadable(String),

    /// The extractor itself crashed.
    #[error("{0}")]
    Crashed(String),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Return the plain text of the PDF at `path`. May be empty or whitespace.
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Build the extractor selected by configuration.
pub fn from_config(config: &ExtractorConfig) -> Arc<dyn TextExtractor> {
    match config.backend {
        ExtractorBackend::Native => Arc::new(NativePdfExtractor),
        ExtractorBackend::Pdftotext => Arc::new(PdftotextExtractor::new(CommandExecutor::new(
            config.pdftotext_timeout,
        ))),
    }
}

/// In-process extraction with `pdf-extract`, run on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePdfExtractor;

#[async_trait]
impl TextExtractor for NativePdfExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let path = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&path).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                ExtractError::Crashed(panic_message(e.into_panic()))
            } else {
                ExtractError::Crashed(e.to_string())
            }
        })?;

        result.map_err(ExtractError::Unreadable)
    }
}

/// Extraction through poppler's `pdftotext`, writing to stdout.
#[derive(Debug, Clone)]
pub struct PdftotextExtractor {
    executor: CommandExecutor,
}

impl PdftotextExtractor {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl TextExtractor for PdftotextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let path = path.to_str().ok_or_else(|| {
            ExtractError::Unreadable(format!("non UTF-8 path {}", path.display()))
        })?;

        let output = self
            .executor
            .execute("pdftotext", &["-enc", "UTF-8", path, "-"])
            .await
            .map_err(|e| match e {
                CommandError::Failed { .. } => ExtractError::Unreadable(e.to_string()),
                CommandError::Spawn { .. } | CommandError::TimedOut { .. } => {
                    ExtractError::Crashed(e.to_string())
                }
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    #[tokio::test]
    async fn native_extractor_rejects_non_pdf_bytes() {
        let path = PathBuf::from(format!("target/not-a-pdf-{}.pdf", Uuid::new_v4()));
        tokio::fs::create_dir_all("target").await.unwrap();
        tokio::fs::write(&path, b"plain text pretending to be a pdf")
            .await
            .unwrap();

        let result = NativePdfExtractor.extract_text(&path).await;
        let _ = tokio::fs::remove_file(&path).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn pdftotext_failure_is_an_error() {
        let extractor =
            PdftotextExtractor::new(CommandExecutor::new(std::time::Duration::from_secs(5)));
        // Either the binary is missing or the file is; both must fail.
        let result = extractor
            .extract_text(Path::new("target/missing-input.pdf"))
            .await;
        assert!(result.is_err());
    }
}
