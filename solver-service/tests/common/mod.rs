use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::SecretString;
use service_core::config::Config as CoreConfig;
use solver_service::config::{
    ExtractorBackend, ExtractorConfig, GeminiSettings, SmtpConfig, SolverConfig, UploadConfig,
};
use solver_service::services::extractor::ExtractError;
use solver_service::services::providers::gemini::GeminiTextProvider;
use solver_service::services::{EmailProvider, MockEmailProvider, ScratchDir, TextExtractor};
use solver_service::startup::{AppState, Application};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_MODEL: &str = "gemini-test";

/// Uploads whose bytes start with this marker fail extraction.
pub const CORRUPT_MARKER: &str = "%CORRUPT";

/// Treats the uploaded bytes as the document's text, so each test controls
/// exactly what the prompt will contain.
pub struct EchoExtractor;

#[async_trait]
impl TextExtractor for EchoExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExtractError::Crashed(e.to_string()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        if text.starts_with(CORRUPT_MARKER) {
            return Err(ExtractError::Unreadable("Invalid file header".to_string()));
        }
        Ok(text)
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub gemini: MockServer,
    pub email: Arc<MockEmailProvider>,
    pub scratch_path: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_email(MockEmailProvider::new(true)).await
    }

    pub async fn spawn_with_email(email: MockEmailProvider) -> Self {
        let gemini = MockServer::start().await;
        let scratch_path = format!("target/test-scratch-{}", Uuid::new_v4());
        let config = test_config(&gemini.uri(), &scratch_path);

        let email = Arc::new(email);
        let state = AppState {
            scratch: ScratchDir::create(&scratch_path)
                .await
                .expect("Failed to create scratch directory"),
            extractor: Arc::new(EchoExtractor),
            text_provider: Arc::new(
                GeminiTextProvider::new(&config.gemini).expect("Failed to build Gemini client"),
            ),
            email_provider: email.clone() as Arc<dyn EmailProvider>,
        };

        let app = Application::build_with_state(&config, state)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            gemini,
            email,
            scratch_path,
        }
    }

    /// Make the next Gemini call answer with `text` as the first candidate.
    pub async fn gemini_replies_with(&self, text: &str) {
        self.gemini_responds(ResponseTemplate::new(200).set_body_json(candidate_body(text)))
            .await;
    }

    pub async fn gemini_responds(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", TEST_MODEL)))
            .respond_with(response)
            .mount(&self.gemini)
            .await;
    }

    /// POST a single `file` part to `/upload`.
    pub async fn upload(&self, file_name: &str, contents: &str) -> reqwest::Response {
        let part = Part::bytes(contents.as_bytes().to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .expect("Invalid mime type");

        self.upload_form(Form::new().part("file", part)).await
    }

    pub async fn upload_form(&self, form: Form) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/upload", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Files currently left in the scratch directory.
    pub async fn scratch_entries(&self) -> Vec<String> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.scratch_path)
            .await
            .expect("Failed to read scratch directory");
        while let Some(entry) = dir.next_entry().await.expect("Failed to read entry") {
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.scratch_path).await;
    }
}

pub fn candidate_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 40 }
    })
}

pub fn test_config(gemini_base: &str, scratch_path: &str) -> SolverConfig {
    SolverConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "debug".to_string(),
        },
        gemini: GeminiSettings {
            api_key: SecretString::new("test-key".to_string()),
            api_base: gemini_base.to_string(),
            model: TEST_MODEL.to_string(),
            timeout: Duration::from_secs(5),
        },
        upload: UploadConfig {
            scratch_dir: scratch_path.into(),
            max_upload_bytes: 1024 * 1024,
        },
        extractor: ExtractorConfig {
            backend: ExtractorBackend::Native,
            pdftotext_timeout: Duration::from_secs(5),
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            user: String::new(),
            password: SecretString::new(String::new()),
            from_email: "noreply@example.com".to_string(),
            from_name: "Study Buddy".to_string(),
            enabled: false,
        },
        otlp_endpoint: None,
    }
}
