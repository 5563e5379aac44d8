/// In-memory document store
///
/// Evaluates the [`Query`] model directly over JSON documents held in process
/// memory. Used by the test suites and by `STORE_BACKEND=memory` for local
/// runs without a search engine.
///
/// # Matching Rules
///
/// - `Term`: JSON equality; array fields match when any element is equal
/// - `Range`: inclusive; numbers compare numerically, strings lexicographically
/// - `QueryString`: whitespace-separated terms, OR semantics, case-insensitive
///   whole-word match, a trailing `*` makes a term a prefix. Syntax it does not
///   understand is ignored, which mirrors a lenient query.
///
/// Highlight fragments are whole field values with matched words wrapped in
/// the requested tags.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{
    Collection, Document, DocumentStore, Query, SearchHit, SearchRequest, SearchResponse, Sort,
    SortOrder, StoreError, StoreResult, Version, DEFAULT_PAGE_SIZE,
};

const PRIMARY_TERM: u64 = 1;

#[derive(Debug, Clone)]
struct Stored {
    seq_no: u64,
    source: Value,
}

impl Stored {
    fn version(&self) -> Version {
        Version {
            seq_no: self.seq_no,
            primary_term: PRIMARY_TERM,
        }
    }
}

/// Process-local [`DocumentStore`]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Stored>>>,
    seq_no: AtomicU64,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            seq_no: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates an outage; every call fails with `StoreError::Transport`
    /// while unavailable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Transport("memory store marked unavailable".to_string()))
        }
    }

    fn next_seq_no(&self) -> u64 {
        self.seq_no.fetch_add(1, AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.check_available()?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| Document {
                id: id.to_string(),
                version: stored.version(),
                source: stored.source.clone(),
            }))
    }

    async fn search(
        &self,
        collection: Collection,
        request: &SearchRequest,
    ) -> StoreResult<SearchResponse> {
        self.check_available()?;

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(SearchResponse::default());
        };

        let mut matched: Vec<(&String, &Stored)> = docs
            .iter()
            .filter(|(_, stored)| matches(&request.query, &stored.source))
            .collect();
        matched.sort_by(|(_, a), (_, b)| compare_sorted(&request.sort, &a.source, &b.source));

        let total = matched.len() as u64;
        let from = request.from.unwrap_or(0);
        let size = request.size.unwrap_or(DEFAULT_PAGE_SIZE);

        let text_terms = collect_text_clauses(&request.query);
        let hits = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(id, stored)| {
                let highlight = match &request.highlight {
                    Some(hl) => hl
                        .fields
                        .iter()
                        .filter_map(|field| {
                            let fragments = highlight_field(
                                &stored.source,
                                field,
                                &text_terms,
                                &hl.pre_tag,
                                &hl.post_tag,
                            );
                            (!fragments.is_empty()).then(|| (field.clone(), fragments))
                        })
                        .collect(),
                    None => HashMap::new(),
                };

                SearchHit {
                    id: id.clone(),
                    version: stored.version(),
                    source: project(&stored.source, request.source_fields.as_deref()),
                    highlight,
                }
            })
            .collect();

        Ok(SearchResponse { total, hits })
    }

    async fn index(
        &self,
        collection: Collection,
        id: &str,
        source: &Value,
    ) -> StoreResult<Version> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        let stored = Stored {
            seq_no: self.next_seq_no(),
            source: source.clone(),
        };
        let version = stored.version();
        collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), stored);
        Ok(version)
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        source: &Value,
    ) -> StoreResult<Version> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }

        let stored = Stored {
            seq_no: self.next_seq_no(),
            source: source.clone(),
        };
        let version = stored.version();
        docs.insert(id.to_string(), stored);
        Ok(version)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: &Value,
        expected: Option<Version>,
    ) -> StoreResult<Version> {
        self.check_available()?;

        let Value::Object(patch) = partial else {
            return Err(StoreError::Serialization(
                "partial update must be a JSON object".to_string(),
            ));
        };

        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        if expected.is_some_and(|v| v != stored.version()) {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }

        if !stored.source.is_object() {
            stored.source = Value::Object(Map::new());
        }
        if let Value::Object(target) = &mut stored.source {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(key);
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        stored.seq_no = self.next_seq_no();
        Ok(stored.version())
    }

    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        expected: Option<Version>,
    ) -> StoreResult<()> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        let current = docs.get(id).map(Stored::version).ok_or_else(|| StoreError::NotFound {
            collection,
            id: id.to_string(),
        })?;

        if expected.is_some_and(|v| v != current) {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }

        docs.remove(id);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }

    async fn ensure_collections(&self) -> StoreResult<()> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        for collection in Collection::ALL {
            collections.entry(collection).or_default();
        }
        Ok(())
    }
}

/// Non-null values of a top-level field, flattening arrays
fn field_values<'a>(source: &'a Value, field: &str) -> Vec<&'a Value> {
    match source.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(value) => vec![value],
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches(query: &Query, source: &Value) -> bool {
    match query {
        Query::MatchAll => true,
        Query::Term { field, value } => field_values(source, field).into_iter().any(|v| v == value),
        Query::Range { field, gte, lte } => field_values(source, field).into_iter().any(|v| {
            let above = gte.as_ref().map_or(true, |bound| {
                matches!(compare_values(v, bound), Some(Ordering::Greater | Ordering::Equal))
            });
            let below = lte.as_ref().map_or(true, |bound| {
                matches!(compare_values(v, bound), Some(Ordering::Less | Ordering::Equal))
            });
            above && below
        }),
        Query::Exists { field } => !field_values(source, field).is_empty(),
        Query::QueryString { query, fields, .. } => {
            let terms = parse_terms(query);
            !terms.is_empty()
                && text_values(source, fields)
                    .into_iter()
                    .any(|text| words(text).any(|word| terms.iter().any(|t| t.matches(word))))
        }
        Query::Bool(clauses) => {
            clauses.must.iter().all(|q| matches(q, source))
                && clauses.filter.iter().all(|q| matches(q, source))
                && !clauses.must_not.iter().any(|q| matches(q, source))
        }
    }
}

/// String values searched by a free-text clause; no fields means every field
fn text_values<'a>(source: &'a Value, fields: &[String]) -> Vec<&'a str> {
    let values: Vec<&Value> = if fields.is_empty() {
        match source {
            Value::Object(map) => map
                .keys()
                .flat_map(|key| field_values(source, key))
                .collect(),
            _ => Vec::new(),
        }
    } else {
        fields
            .iter()
            .flat_map(|field| field_values(source, field))
            .collect()
    };

    values.into_iter().filter_map(Value::as_str).collect()
}

#[derive(Debug, Clone, PartialEq)]
struct Term {
    text: String,
    prefix: bool,
}

impl Term {
    fn matches(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        if self.prefix {
            word.starts_with(&self.text)
        } else {
            word == self.text
        }
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn parse_terms(query: &str) -> Vec<Term> {
    let mut terms = Vec::new();

    for raw in query.split_whitespace() {
        if matches!(raw, "AND" | "OR" | "NOT" | "&&" | "||") {
            continue;
        }

        let prefix = raw.trim_end_matches(|c| c == '"' || c == ')').ends_with('*');
        let parts: Vec<String> = words(raw).map(str::to_lowercase).collect();
        let last = parts.len().saturating_sub(1);
        for (i, text) in parts.into_iter().enumerate() {
            terms.push(Term {
                text,
                prefix: prefix && i == last,
            });
        }
    }

    terms
}

/// Free-text clauses that contribute to highlighting, as (terms, fields)
fn collect_text_clauses(query: &Query) -> Vec<(Vec<Term>, Vec<String>)> {
    match query {
        Query::QueryString { query, fields, .. } => vec![(parse_terms(query), fields.clone())],
        Query::Bool(clauses) => clauses
            .must
            .iter()
            .chain(clauses.filter.iter())
            .flat_map(collect_text_clauses)
            .collect(),
        _ => Vec::new(),
    }
}

fn highlight_field(
    source: &Value,
    field: &str,
    clauses: &[(Vec<Term>, Vec<String>)],
    pre_tag: &str,
    post_tag: &str,
) -> Vec<String> {
    let terms: Vec<&Term> = clauses
        .iter()
        .filter(|(_, fields)| fields.is_empty() || fields.iter().any(|f| f == field))
        .flat_map(|(terms, _)| terms.iter())
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    field_values(source, field)
        .into_iter()
        .filter_map(Value::as_str)
        .filter_map(|text| highlight_text(text, &terms, pre_tag, post_tag))
        .collect()
}

fn highlight_text(text: &str, terms: &[&Term], pre_tag: &str, post_tag: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut matched = false;

    for (start, word) in word_spans(text) {
        if terms.iter().any(|t| t.matches(word)) {
            out.push_str(&text[last..start]);
            out.push_str(pre_tag);
            out.push_str(word);
            out.push_str(post_tag);
            last = start + word.len();
            matched = true;
        }
    }

    if !matched {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

fn word_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            spans.push((s, &text[s..i]));
        }
    }
    if let Some(s) = start {
        spans.push((s, &text[s..]));
    }

    spans
}

/// Missing values sort last in either direction
fn compare_sorted(sort: &[Sort], a: &Value, b: &Value) -> Ordering {
    for key in sort {
        let left = field_values(a, &key.field).into_iter().next();
        let right = field_values(b, &key.field).into_iter().next();

        let ordering = match (left, right) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match key.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

fn project(source: &Value, fields: Option<&[String]>) -> Value {
    match (fields, source) {
        (Some(fields), Value::Object(map)) => Value::Object(
            map.iter()
                .filter(|(key, _)| fields.iter().any(|f| f == *key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        _ => source.clone(),
    }
}
