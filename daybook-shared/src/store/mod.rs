/// Document store abstraction
///
/// All durable state lives in an external document-search engine. Services
/// talk to it only through the [`DocumentStore`] trait, so the backend can be
/// swapped without touching business logic:
///
/// - [`elastic::ElasticStore`]: Elasticsearch/OpenSearch over HTTP
/// - [`memory::MemoryStore`]: process-local store for tests and local runs
///
/// # Versions
///
/// Every read returns the document's [`Version`]. Passing it back to
/// [`DocumentStore::update`] or [`DocumentStore::delete`] turns the write into
/// a compare-and-set that fails with [`StoreError::Conflict`] when someone else
/// wrote in between.
///
/// # Example
///
/// ```
/// use daybook_shared::store::{memory::MemoryStore, Collection, DocumentStore};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.create(Collection::Users, "u-1", &json!({"email": "a@b.c"})).await?;
///
/// let doc = store.get(Collection::Users, "u-1").await?.expect("exists");
/// assert_eq!(doc.source["email"], "a@b.c");
/// # Ok(())
/// # }
/// ```

pub mod elastic;
pub mod memory;
pub mod query;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use query::{BoolQuery, Highlight, Query, Sort, SortOrder};

/// Page size used when a search does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Logical collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Journal,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Users, Collection::Journal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Journal => "journal",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optimistic concurrency token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub seq_no: u64,
    pub primary_term: u64,
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: Version,
    pub source: Value,
}

/// A search to run against one collection
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: Query,
    pub sort: Vec<Sort>,
    pub highlight: Option<Highlight>,
    /// Restricts the returned source to these fields
    pub source_fields: Option<Vec<String>>,
    pub from: Option<usize>,
    pub size: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            sort: Vec::new(),
            highlight: None,
            source_fields: None,
            from: None,
            size: None,
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn source_fields(mut self, fields: &[&str]) -> Self {
        self.source_fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn from(mut self, from: usize) -> Self {
        self.from = Some(from);
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub version: Version,
    pub source: Value,
    /// Highlighted fragments keyed by field
    pub highlight: HashMap<String, Vec<String>>,
}

/// A page of search results
///
/// `total` counts every match, not just the returned page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

/// Store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Point write against a missing document
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    /// Create of an existing id, or a stale version
    #[error("Conflicting write to {collection}/{id}")]
    Conflict { collection: Collection, id: String },

    /// Store could not be reached
    #[error("Document store unavailable: {0}")]
    Transport(String),

    /// Store answered with an unexpected status
    #[error("Document store returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// Payload could not be encoded or decoded
    #[error("Malformed document: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-scoped document store with search
///
/// Reads of a missing id return `Ok(None)`; only writes report
/// [`StoreError::NotFound`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a document by id
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Runs a search
    async fn search(
        &self,
        collection: Collection,
        request: &SearchRequest,
    ) -> StoreResult<SearchResponse>;

    /// Writes a document, replacing any existing one
    async fn index(&self, collection: Collection, id: &str, source: &Value)
        -> StoreResult<Version>;

    /// Writes a document only if the id is free
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if a document with this id exists
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        source: &Value,
    ) -> StoreResult<Version>;

    /// Merges top-level fields of `partial` into a document
    ///
    /// A `null` value clears the field. With `expected` set, the write only
    /// happens if the document is still at that version.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: &Value,
        expected: Option<Version>,
    ) -> StoreResult<Version>;

    /// Removes a document
    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        expected: Option<Version>,
    ) -> StoreResult<()>;

    /// Checks whether an id is taken
    async fn exists(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }

    /// Checks connectivity
    async fn ping(&self) -> StoreResult<()>;

    /// Creates the backing collections if they are missing
    async fn ensure_collections(&self) -> StoreResult<()>;
}
