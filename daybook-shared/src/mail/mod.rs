/// Outgoing mail
///
/// The service layer hands finished [`MailMessage`]s to a [`Mailer`]:
///
/// - [`http::HttpMailer`]: transactional mail provider over HTTP
/// - [`outbox::OutboxMailer`]: keeps messages in memory and logs them
///
/// Message bodies are produced by [`templates`].

pub mod http;
pub mod outbox;
pub mod templates;

use async_trait::async_trait;
use serde::Serialize;

/// A rendered email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mail delivery failures
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Provider could not be reached
    #[error("Mail provider unavailable: {0}")]
    Transport(String),

    /// Provider refused the message
    #[error("Mail provider rejected message with {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}
