//! Mock provider for tests and offline runs.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Returns a fixed reply and remembers the last prompt it saw.
pub struct MockTextProvider {
    reply: Option<String>,
    call_count: AtomicU64,
    last_prompt: Mutex<Option<String>>,
}

impl MockTextProvider {
    /// Reply with `text` to every prompt.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            call_count: AtomicU64::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Reply with no content at all.
    pub fn empty() -> Self {
        Self {
            reply: None,
            call_count: AtomicU64::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .map(|prompt| prompt.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        tracing::info!(prompt_len = prompt.len(), "[MOCK] Answer would be generated");

        Ok(ProviderResponse {
            text: self.reply.clone(),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: self.reply.as_ref().map_or(0, |r| r.len() as i32 / 4),
            finish_reason: FinishReason::Complete,
        })
    }
}
