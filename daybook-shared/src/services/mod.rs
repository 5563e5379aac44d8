/// Service layer
///
/// Each service depends only on the [`DocumentStore`] and [`Mailer`] traits,
/// never on a concrete backend.
///
/// - [`account::AccountService`]: registration, activation, login, profile,
///   password reset
/// - [`journal::JournalService`]: one entry per user per day
/// - [`search::SearchService`]: full-text/date search and streaks
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use daybook_shared::config::ServiceConfig;
/// use daybook_shared::mail::outbox::OutboxMailer;
/// use daybook_shared::services::Services;
/// use daybook_shared::store::memory::MemoryStore;
///
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(OutboxMailer::new()),
///     ServiceConfig::default(),
/// );
/// # let _ = services;
/// ```

pub mod account;
pub mod journal;
pub mod search;

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::mail::Mailer;
use crate::store::DocumentStore;

use account::AccountService;
use journal::JournalService;
use search::SearchService;

/// All services wired to the same store, mailer and configuration
#[derive(Clone)]
pub struct Services {
    pub accounts: Arc<AccountService>,
    pub journal: Arc<JournalService>,
    pub search: Arc<SearchService>,
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<ServiceConfig>,
}

impl Services {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        config: ServiceConfig,
    ) -> Self {
        let config = Arc::new(config);

        Self {
            accounts: Arc::new(AccountService::new(
                store.clone(),
                mailer,
                config.clone(),
            )),
            journal: Arc::new(JournalService::new(store.clone())),
            search: Arc::new(SearchService::new(store.clone())),
            store,
            config,
        }
    }
}
