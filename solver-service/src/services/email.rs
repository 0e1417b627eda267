//! Outbound email, used by the frontend to mail generated solutions.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email provider not enabled")]
    NotEnabled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Send error: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<(), EmailError>;
}

pub struct SmtpProvider {
    from: Mailbox,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| EmailError::Configuration(format!("Invalid from address: {}", e)))?;

        if !config.enabled {
            return Ok(Self {
                from,
                transport: None,
            });
        }

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| EmailError::Configuration(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            from,
            transport: Some(transport),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailMessage) -> Result<(), EmailError> {
        let transport = self.transport.as_ref().ok_or(EmailError::NotEnabled)?;

        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| EmailError::InvalidRecipient(format!("{}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| EmailError::SendFailed(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");

        Ok(())
    }
}

/// Mock email provider for tests.
pub struct MockEmailProvider {
    enabled: bool,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<(), EmailError> {
        if !self.enabled {
            return Err(EmailError::NotEnabled);
        }

        self.send_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }

        tracing::info!(to = %email.to, subject = %email.subject, "[MOCK] Email would be sent");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn smtp_config(enabled: bool) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "user".to_string(),
            password: SecretString::new("password".to_string()),
            from_email: "noreply@example.com".to_string(),
            from_name: "Study Buddy".to_string(),
            enabled,
        }
    }

    #[tokio::test]
    async fn disabled_smtp_provider_refuses_to_send() {
        let provider = SmtpProvider::new(&smtp_config(false)).unwrap();
        let err = provider
            .send(&EmailMessage {
                to: "student@example.com".to_string(),
                subject: "Solutions".to_string(),
                body: "Q1: 4".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, EmailError::NotEnabled));
    }

    #[test]
    fn invalid_sender_is_a_configuration_error() {
        let mut config = smtp_config(false);
        config.from_email = "not an address".to_string();
        assert!(matches!(
            SmtpProvider::new(&config),
            Err(EmailError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn mock_provider_records_messages() {
        let provider = MockEmailProvider::new(true);
        let message = EmailMessage {
            to: "student@example.com".to_string(),
            subject: "Solutions".to_string(),
            body: "Q1: 4".to_string(),
        };

        provider.send(&message).await.unwrap();

        assert_eq!(provider.send_count(), 1);
        assert_eq!(provider.sent(), vec![message]);
    }
}
