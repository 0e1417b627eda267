use secrecy::SecretString;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Placeholder used when no Gemini key is configured. Every outbound call made
/// with it is rejected by the API, which surfaces as an upstream error.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_GEMINI_API_KEY";

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub upload: UploadConfig,
    pub extractor: ExtractorConfig,
    pub smtp: SmtpConfig,
    /// OTLP collector endpoint; span export is disabled when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: SecretString,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub backend: ExtractorBackend,
    pub pdftotext_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorBackend {
    /// In-process extraction with `pdf-extract`.
    Native,
    /// Poppler's `pdftotext` binary.
    Pdftotext,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

impl SolverConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(SolverConfig {
            common: common_config,
            gemini: GeminiSettings {
                api_key: SecretString::new(get_env(
                    "GEMINI_API_KEY",
                    Some(PLACEHOLDER_API_KEY),
                    is_prod,
                )?),
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), false)?,
                model: get_env("GEMINI_MODEL", Some(DEFAULT_GEMINI_MODEL), false)?,
                timeout: Duration::from_secs(parse_setting(
                    "GEMINI_TIMEOUT_SECS",
                    &get_env("GEMINI_TIMEOUT_SECS", Some("120"), false)?,
                )?),
            },
            upload: UploadConfig {
                scratch_dir: get_env("SCRATCH_DIR", Some("uploads"), false)?.into(),
                max_upload_bytes: parse_setting(
                    "MAX_UPLOAD_BYTES",
                    &get_env(
                        "MAX_UPLOAD_BYTES",
                        Some(&DEFAULT_MAX_UPLOAD_BYTES.to_string()),
                        false,
                    )?,
                )?,
            },
            extractor: ExtractorConfig {
                backend: parse_setting(
                    "PDF_EXTRACTOR",
                    &get_env("PDF_EXTRACTOR", Some("native"), false)?,
                )?,
                pdftotext_timeout: Duration::from_secs(parse_setting(
                    "PDFTOTEXT_TIMEOUT_SECS",
                    &get_env("PDFTOTEXT_TIMEOUT_SECS", Some("60"), false)?,
                )?),
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), false)?,
                port: parse_setting("SMTP_PORT", &get_env("SMTP_PORT", Some("587"), false)?)?,
                user: get_env("SMTP_USER", Some(""), false)?,
                password: SecretString::new(get_env("SMTP_PASSWORD", Some(""), false)?),
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), false)?,
                from_name: get_env("SMTP_FROM_NAME", Some("Study Buddy"), false)?,
                enabled: parse_setting(
                    "SMTP_ENABLED",
                    &get_env("SMTP_ENABLED", Some("false"), false)?,
                )?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        })
    }
}

impl FromStr for ExtractorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" | "pdf-extract" => Ok(ExtractorBackend::Native),
            "pdftotext" => Ok(ExtractorBackend::Pdftotext),
            _ => Err(format!("Invalid PDF extractor: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractor_backend_parses_known_names() {
        assert_eq!("native".parse::<ExtractorBackend>(), Ok(ExtractorBackend::Native));
        assert_eq!("PDFTOTEXT".parse::<ExtractorBackend>(), Ok(ExtractorBackend::Pdftotext));
        assert!("tesseract".parse::<ExtractorBackend>().is_err());
    }

    #[test]
    fn malformed_numbers_are_config_errors() {
        let err = parse_setting::<u64>("GEMINI_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("GEMINI_TIMEOUT_SECS"));
    }

    #[test]
    fn settings_tolerate_surrounding_whitespace() {
        assert_eq!(parse_setting::<u16>("SMTP_PORT", " 2525 ").unwrap(), 2525);
        assert!(parse_setting::<bool>("SMTP_ENABLED", "true").unwrap());
    }
}
