//! Common test utilities for API integration tests
//!
//! Every test builds the full router over an in-memory store and an outbox
//! mailer, so no external services are needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use daybook_api::app::{build_router, AppState};
use daybook_api::config::{
    ApiConfig, Config, JwtConfig, MailConfig, StoreBackend, StoreConfig, DEFAULT_MAIL_API_URL,
};
use daybook_shared::config::ServiceConfig;
use daybook_shared::mail::outbox::OutboxMailer;
use daybook_shared::services::Services;
use daybook_shared::store::memory::MemoryStore;
use serde_json::Value;
use tower::Service as _;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing the router and its backends
pub struct TestApp {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<OutboxMailer>,
}

/// Status and decoded JSON body of a response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(OutboxMailer::new());
        let services = Services::new(store.clone(), mailer.clone(), config.service.clone());

        Self {
            app: build_router(AppState::new(services, config)),
            store,
            mailer,
        }
    }

    /// Sends a request, with an optional JSON body and bearer token
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send("GET", uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send("POST", uri, Some(body), token).await
    }

    /// Token carried by the last link mailed to `email`
    pub fn mailed_token(&self, email: &str) -> String {
        let message = self.mailer.last_to(email).expect("mail should have been sent");
        message
            .text
            .split_whitespace()
            .find_map(|word| {
                word.split_once("/verify/")
                    .or_else(|| word.split_once("/reset/"))
                    .map(|(_, token)| token.to_string())
            })
            .expect("mail should contain a link")
    }

    /// Registers and activates an account, returning its session token
    pub async fn sign_up(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/account/register",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        let token = self.mailed_token(email);
        let response = self.get(&format!("/api/account/verify/{}", token), None).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        response.body["result"]["token"]
            .as_str()
            .expect("verify should return a session token")
            .to_string()
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            url: "http://localhost:9200".to_string(),
            index_prefix: "daybook_test".to_string(),
        },
        mail: MailConfig {
            api_url: DEFAULT_MAIL_API_URL.to_string(),
            api_key: None,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        service: ServiceConfig {
            reset_token_ttl_hours: 24,
            site_url: "https://daybook.test".to_string(),
            product_name: "Daybook".to_string(),
            mail_from: "no-reply@daybook.test".to_string(),
        },
    }
}
