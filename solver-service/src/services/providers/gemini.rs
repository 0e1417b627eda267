//! Gemini `generateContent` client.
//!
//! One blocking (from the caller's point of view) request per prompt, API key
//! in the `key` query parameter, JSON request and response bodies.

use super::{
    FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider,
    GENERIC_UPSTREAM_FAILURE,
};
use crate::config::GeminiSettings;
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Gemini text provider.
pub struct GeminiTextProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(settings: &GeminiSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key: settings.api_key.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the API URL for the given method. The key is attached separately.
    fn api_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, self.model, method)
    }

    fn build_generation_config(params: &GenerationParams) -> GenerationConfig {
        GenerationConfig {
            response_mime_type: params
                .json_output
                .then(|| "application/json".to_string()),
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: Some(Self::build_generation_config(params)),
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_error_message(&body);

            tracing::warn!(
                model = %self.model,
                status = status.as_u16(),
                error = %message,
                "Gemini API returned an error"
            );

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.without_url().to_string()))?;

        let usage = api_response.usage_metadata.clone().unwrap_or_default();
        let input_tokens = usage.prompt_token_count.unwrap_or(0);
        let output_tokens = usage.candidates_token_count.unwrap_or(0);
        let finish_reason = api_response.finish_reason();

        counter!("solver_upstream_tokens_total", "direction" => "input")
            .increment(input_tokens.max(0) as u64);
        counter!("solver_upstream_tokens_total", "direction" => "output")
            .increment(output_tokens.max(0) as u64);

        tracing::info!(
            model = %self.model,
            input_tokens,
            output_tokens,
            finish_reason = finish_reason.as_str(),
            "Gemini API call completed"
        );

        Ok(ProviderResponse {
            text: api_response.first_text().map(str::to_string),
            input_tokens,
            output_tokens,
            finish_reason,
        })
    }
}

/// Pull `error.message` out of an upstream error body, falling back to a
/// generic message when the body is not the documented shape.
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_UPSTREAM_FAILURE.to_string())
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// candidates[0].content.parts[0].text, if non-empty.
    fn first_text(&self) -> Option<&str> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let part = content.parts.first()?;
        part.text.as_deref().filter(|text| !text.is_empty())
    }

    fn finish_reason(&self) -> FinishReason {
        FinishReason::from_api(
            self.candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref()),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
