/// Journal entry management
///
/// Each user has at most one entry per UTC calendar day. The entry is stored
/// under an id derived from `(user_id, day)` and written with a
/// create-if-absent call, so two concurrent writers for the same day cannot
/// both succeed.
///
/// # Content Rules
///
/// - At most [`MAX_ENTRIES`] lines per day
/// - Markup is stripped and whitespace trimmed before anything is checked
/// - Each line is 1..=[`MAX_ENTRY_LENGTH`] characters after that
///
/// Ownership is checked on every read-modify path, and a foreign entry is
/// reported exactly like a missing one.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use daybook_shared::services::journal::JournalService;
/// use daybook_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let journal = JournalService::new(Arc::new(MemoryStore::new()));
///
/// let today = Utc::now();
/// journal.create("user-1", &["Went for a run".to_string()], today).await?;
///
/// let entry = journal.get_by_date("user-1", today).await?;
/// assert_eq!(entry.entries, vec!["Went for a run"]);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tracing::{debug, info};

use crate::auth::token::{is_document_id, journal_entry_id};
use crate::error::{ServiceError, ServiceResult};
use crate::models::journal::{format_date, start_of_day, JournalDocument, JournalEntry};
use crate::store::{Collection, DocumentStore, Query, SearchRequest, StoreError};

/// Most lines allowed in one day's entry
pub const MAX_ENTRIES: usize = 7;

/// Longest allowed line, in characters, after sanitization
pub const MAX_ENTRY_LENGTH: usize = 500;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Strips markup tags and surrounding whitespace
///
/// ```
/// use daybook_shared::services::journal::sanitize;
///
/// assert_eq!(sanitize("  <b>bold</b> move "), "bold move");
/// assert_eq!(sanitize("<div></div>"), "");
/// ```
pub fn sanitize(entry: &str) -> String {
    TAG_RE.replace_all(entry, "").trim().to_string()
}

/// Sanitizes and checks a day's lines
///
/// # Errors
///
/// - `TooManyEntries` for more than [`MAX_ENTRIES`] lines
/// - `JournalEntryEmpty` for no lines, or a line that sanitizes to nothing
/// - `JournalEntryInvalid` for a line longer than [`MAX_ENTRY_LENGTH`]
pub fn validate_entries(entries: &[String]) -> ServiceResult<Vec<String>> {
    if entries.len() > MAX_ENTRIES {
        return Err(ServiceError::TooManyEntries);
    }
    if entries.is_empty() {
        return Err(ServiceError::JournalEntryEmpty);
    }

    entries
        .iter()
        .map(|entry| {
            let clean = sanitize(entry);
            if clean.chars().count() > MAX_ENTRY_LENGTH {
                Err(ServiceError::JournalEntryInvalid)
            } else if clean.is_empty() {
                Err(ServiceError::JournalEntryEmpty)
            } else {
                Ok(clean)
            }
        })
        .collect()
}

/// Journal Entry Manager
pub struct JournalService {
    store: Arc<dyn DocumentStore>,
}

impl JournalService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Writes the entry for the day containing `date`
    ///
    /// # Errors
    ///
    /// - `UserUnauthorized` if `user_id` is empty
    /// - content errors from [`validate_entries`]
    /// - `EntryAlreadyExists` if the user already wrote that day
    pub async fn create(
        &self,
        user_id: &str,
        entries: &[String],
        date: DateTime<Utc>,
    ) -> ServiceResult<JournalEntry> {
        if user_id.is_empty() {
            return Err(ServiceError::UserUnauthorized);
        }
        let entries = validate_entries(entries)?;

        let day = start_of_day(date);
        let id = journal_entry_id(user_id, day.date_naive());
        let doc = JournalDocument {
            user_id: user_id.to_string(),
            entries,
            date: day,
            create_date: Utc::now(),
        };

        let source = serde_json::to_value(&doc).map_err(StoreError::from)?;
        let version = match self.store.create(Collection::Journal, &id, &source).await {
            Ok(version) => version,
            Err(StoreError::Conflict { .. }) => return Err(ServiceError::EntryAlreadyExists),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user_id, entry_id = %id, date = %format_date(day), "Created journal entry");

        Ok(JournalEntry {
            id,
            user_id: doc.user_id,
            entries: doc.entries,
            date: doc.date,
            create_date: doc.create_date,
            version: Some(version),
        })
    }

    /// Replaces the lines of an existing entry
    ///
    /// Content is validated before the entry is looked up.
    ///
    /// # Errors
    ///
    /// - `UserUnauthorized` if `user_id` is empty
    /// - content errors from [`validate_entries`]
    /// - `EntryNotFound` if the entry is missing or not owned by `user_id`
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        entries: &[String],
    ) -> ServiceResult<JournalEntry> {
        if user_id.is_empty() {
            return Err(ServiceError::UserUnauthorized);
        }
        let entries = validate_entries(entries)?;

        let mut entry = self.load_owned(id, user_id).await?;

        let version = self
            .store
            .update(Collection::Journal, id, &json!({ "entries": entries }), None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => ServiceError::EntryNotFound,
                other => other.into(),
            })?;

        debug!(user_id = %user_id, entry_id = %id, "Updated journal entry");

        entry.entries = entries;
        entry.version = Some(version);
        Ok(entry)
    }

    /// Removes an entry
    ///
    /// # Errors
    ///
    /// - `UserUnauthorized` if `user_id` is empty
    /// - `EntryNotFound` if the entry is missing or not owned by `user_id`
    pub async fn delete(&self, id: &str, user_id: &str) -> ServiceResult<()> {
        if user_id.is_empty() {
            return Err(ServiceError::UserUnauthorized);
        }

        self.load_owned(id, user_id).await?;

        self.store
            .delete(Collection::Journal, id, None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => ServiceError::EntryNotFound,
                other => other.into(),
            })?;

        info!(user_id = %user_id, entry_id = %id, "Deleted journal entry");
        Ok(())
    }

    /// Fetches the entry for the day containing `date`
    ///
    /// # Errors
    ///
    /// - `UserUnauthorized` if `user_id` is empty
    /// - `NoJournalWithDate` if there is none
    pub async fn get_by_date(
        &self,
        user_id: &str,
        date: DateTime<Utc>,
    ) -> ServiceResult<JournalEntry> {
        if user_id.is_empty() {
            return Err(ServiceError::UserUnauthorized);
        }

        let day = start_of_day(date);
        let request = SearchRequest::new(
            Query::bool()
                .must(Query::term("user_id", user_id))
                .must(Query::term("date", format_date(day)))
                .build(),
        )
        .size(1);

        let response = self.store.search(Collection::Journal, &request).await?;
        let hit = response
            .hits
            .into_iter()
            .next()
            .ok_or(ServiceError::NoJournalWithDate)?;

        Ok(JournalEntry::from_hit(hit)?)
    }

    async fn load_owned(&self, id: &str, user_id: &str) -> ServiceResult<JournalEntry> {
        if !is_document_id(id) {
            return Err(ServiceError::EntryNotFound);
        }

        let doc = self
            .store
            .get(Collection::Journal, id)
            .await?
            .ok_or(ServiceError::EntryNotFound)?;
        let entry = JournalEntry::from_document(doc)?;

        if entry.user_id != user_id {
            debug!(user_id = %user_id, entry_id = %id, "Entry belongs to another user");
            return Err(ServiceError::EntryNotFound);
        }

        Ok(entry)
    }
}
