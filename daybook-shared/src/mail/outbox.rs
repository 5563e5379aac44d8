/// Mailer that keeps messages instead of delivering them
///
/// Used when no mail provider is configured and by the test suites, which read
/// verification and reset tokens back out of the sent messages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use super::{MailError, MailMessage, Mailer};

#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<MailMessage>>,
    failing: AtomicBool,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `send` fail with `MailError::Transport`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every message sent so far, oldest first
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Most recent message sent to `to`
    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("outbox marked failing".to_string()));
        }

        info!(subject = %message.subject, "Mail queued in outbox");

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?;
        sent.push(message.clone());
        Ok(())
    }
}
