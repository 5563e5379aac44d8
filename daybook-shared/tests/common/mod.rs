//! Common test utilities for service integration tests
//!
//! Every test gets a fresh in-memory store and outbox mailer, so tests are
//! independent and need no external services.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use daybook_shared::config::ServiceConfig;
use daybook_shared::mail::outbox::OutboxMailer;
use daybook_shared::mail::MailMessage;
use daybook_shared::services::Services;
use daybook_shared::store::memory::MemoryStore;

/// Test context containing the services and their backends
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<OutboxMailer>,
    pub services: Services,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(OutboxMailer::new());
        let services = Services::new(store.clone(), mailer.clone(), config);

        Self {
            store,
            mailer,
            services,
        }
    }

    /// Last mail sent to `email`
    pub fn last_mail(&self, email: &str) -> MailMessage {
        self.mailer
            .last_to(email)
            .unwrap_or_else(|| panic!("no mail sent to {}", email))
    }

    /// Token carried by the last link mailed to `email`
    pub fn mailed_token(&self, email: &str) -> String {
        token_from_link(&self.last_mail(email).text)
    }

    /// Registers and activates an account, returning the user id
    pub async fn create_user(&self, email: &str, password: &str) -> String {
        self.services
            .accounts
            .create_verification(email, password)
            .await
            .expect("registration should succeed");

        let token = self.mailed_token(email);
        self.services
            .accounts
            .activate(&token)
            .await
            .expect("activation should succeed")
    }

    /// Writes a one-line entry for `date`
    pub async fn write_entry(&self, user_id: &str, text: &str, date: DateTime<Utc>) -> String {
        self.services
            .journal
            .create(user_id, &[text.to_string()], date)
            .await
            .expect("entry should be created")
            .id
    }
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        reset_token_ttl_hours: 24,
        site_url: "https://daybook.test".to_string(),
        product_name: "Daybook".to_string(),
        mail_from: "no-reply@daybook.test".to_string(),
    }
}

/// Extracts the token from the first `/verify/` or `/reset/` link in a body
pub fn token_from_link(body: &str) -> String {
    body.split_whitespace()
        .find_map(|word| {
            word.split_once("/verify/")
                .or_else(|| word.split_once("/reset/"))
                .map(|(_, token)| token.to_string())
        })
        .expect("mail should contain a link")
}

/// UTC midnight of a calendar day
pub fn day(year: i32, month: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, d, 0, 0, 0).unwrap()
}

pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
