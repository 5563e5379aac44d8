//! # Daybook API Server
//!
//! Serves the Daybook journaling API: accounts, daily entries, search and
//! streaks.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p daybook-api
//! ```
//!
//! Set `STORE_BACKEND=memory` to run without a document store; data is then
//! lost on exit. Without `MAIL_API_KEY` outgoing mail is only logged.

use std::sync::Arc;

use daybook_api::{
    app::{build_router, AppState},
    config::{Config, StoreBackend},
};
use daybook_shared::{
    mail::{
        http::{HttpMailer, HttpMailerConfig},
        outbox::OutboxMailer,
        Mailer,
    },
    services::Services,
    store::{
        elastic::{ElasticConfig, ElasticStore},
        memory::MemoryStore,
        DocumentStore,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the log filter is read
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Daybook API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data will not persist");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Elastic => {
            let store = ElasticStore::new(ElasticConfig {
                url: config.store.url.clone(),
                index_prefix: config.store.index_prefix.clone(),
                ..Default::default()
            })?;
            store.ensure_collections().await?;
            tracing::info!(prefix = %config.store.index_prefix, "Document store ready");
            Arc::new(store)
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail.api_key {
        Some(api_key) => Arc::new(HttpMailer::new(HttpMailerConfig {
            endpoint: config.mail.api_url.clone(),
            api_key: api_key.clone(),
            timeout_seconds: 10,
        })?),
        None => {
            tracing::warn!("MAIL_API_KEY not set; outgoing mail will only be logged");
            Arc::new(OutboxMailer::new())
        }
    };

    let services = Services::new(store, mailer, config.service.clone());
    let bind_address = config.bind_address();
    let app = build_router(AppState::new(services, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `LOG_FORMAT=json` switches to structured output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "daybook_api=debug,daybook_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
