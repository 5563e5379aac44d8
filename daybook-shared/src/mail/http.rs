/// Transactional mail over HTTP
///
/// Speaks the SendGrid v3 `mail/send` JSON format with bearer-token auth,
/// which several providers accept.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{MailError, MailMessage, Mailer};

/// Provider settings for [`HttpMailer`]
#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    /// Full URL of the send endpoint
    pub endpoint: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// [`Mailer`] backed by an HTTP mail API
pub struct HttpMailer {
    client: Client,
    config: HttpMailerConfig,
}

impl HttpMailer {
    /// # Errors
    ///
    /// `MailError::Transport` if the HTTP client cannot be built
    pub fn new(config: HttpMailerConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MailError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn payload(message: &MailMessage) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": message.from },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&Self::payload(message))
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, body });
        }

        debug!(subject = %message.subject, "Mail accepted by provider");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let message = MailMessage {
            to: "a@b.c".to_string(),
            from: "no-reply@daybook.test".to_string(),
            subject: "Hello".to_string(),
            text: "plain".to_string(),
            html: "<p>html</p>".to_string(),
        };

        let payload = HttpMailer::payload(&message);

        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "a@b.c");
        assert_eq!(payload["from"]["email"], "no-reply@daybook.test");
        assert_eq!(payload["subject"], "Hello");
        assert_eq!(payload["content"][0]["value"], "plain");
        assert_eq!(payload["content"][1]["type"], "text/html");
    }
}
