/// Query model understood by every [`DocumentStore`](super::DocumentStore)
///
/// The model is a small subset of the Elasticsearch query DSL: enough to
/// express equality, inclusive ranges, field existence, lenient free text and
/// boolean composition. [`Query::to_dsl`] renders it for HTTP backends; the
/// in-memory backend evaluates it directly.
///
/// # Example
///
/// ```
/// use daybook_shared::store::query::{Query, Sort};
///
/// let query = Query::bool()
///     .must(Query::term("user_id", "u-1"))
///     .filter(Query::range("date", Some("2002-04-21T00:00:00Z"), None))
///     .build();
///
/// let dsl = query.to_dsl();
/// assert_eq!(dsl["bool"]["must"][0]["term"]["user_id"], "u-1");
/// assert_eq!(Sort::desc("date").to_dsl()["date"]["order"], "desc");
/// ```

use serde_json::{json, Map, Value};

/// A search predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every document
    MatchAll,

    /// Exact equality; array fields match when any element is equal
    Term { field: String, value: Value },

    /// Inclusive range; a missing bound is open-ended
    Range {
        field: String,
        gte: Option<Value>,
        lte: Option<Value>,
    },

    /// Field is present and not null
    Exists { field: String },

    /// Free-text query over the named fields
    ///
    /// When `lenient` is set, malformed syntax degrades to a best-effort match
    /// instead of failing the request.
    QueryString {
        query: String,
        fields: Vec<String>,
        lenient: bool,
    },

    /// Boolean composition
    Bool(BoolQuery),
}

/// Clauses of a boolean query
///
/// `must` and `filter` are both conjunctive. `filter` does not contribute to
/// highlighting or scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub filter: Vec<Query>,
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn build(self) -> Query {
        Query::Bool(self)
    }
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range<V: Into<Value>>(field: impl Into<String>, gte: Option<V>, lte: Option<V>) -> Self {
        Query::Range {
            field: field.into(),
            gte: gte.map(Into::into),
            lte: lte.map(Into::into),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists {
            field: field.into(),
        }
    }

    /// Lenient free-text query across `fields`
    pub fn text(query: impl Into<String>, fields: &[&str]) -> Self {
        Query::QueryString {
            query: query.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            lenient: true,
        }
    }

    /// Starts a boolean query
    pub fn bool() -> BoolQuery {
        BoolQuery::default()
    }

    /// Renders the query as Elasticsearch DSL
    pub fn to_dsl(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Term { field, value } => json!({ "term": { field: value } }),
            Query::Range { field, gte, lte } => {
                let mut bounds = Map::new();
                if let Some(gte) = gte {
                    bounds.insert("gte".to_string(), gte.clone());
                }
                if let Some(lte) = lte {
                    bounds.insert("lte".to_string(), lte.clone());
                }
                json!({ "range": { field: Value::Object(bounds) } })
            }
            Query::Exists { field } => json!({ "exists": { "field": field } }),
            Query::QueryString {
                query,
                fields,
                lenient,
            } => json!({
                "query_string": {
                    "query": query,
                    "fields": fields,
                    "lenient": lenient,
                }
            }),
            Query::Bool(clauses) => {
                let render = |qs: &[Query]| qs.iter().map(Query::to_dsl).collect::<Vec<_>>();
                json!({
                    "bool": {
                        "must": render(&clauses.must),
                        "filter": render(&clauses.filter),
                        "must_not": render(&clauses.must_not),
                    }
                })
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    pub fn to_dsl(&self) -> Value {
        let order = match self.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        json!({ self.field.as_str(): { "order": order } })
    }
}

/// Highlighting request
///
/// Fragments are whole field values with every match wrapped in
/// `pre_tag`/`post_tag`.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub fields: Vec<String>,
    pub pre_tag: String,
    pub post_tag: String,
}

impl Highlight {
    pub fn new(fields: &[&str], pre_tag: &str, post_tag: &str) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            pre_tag: pre_tag.to_string(),
            post_tag: post_tag.to_string(),
        }
    }

    pub fn to_dsl(&self) -> Value {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.clone(), json!({ "number_of_fragments": 0 })))
            .collect();

        json!({
            "pre_tags": [self.pre_tag],
            "post_tags": [self.post_tag],
            "fields": fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_dsl_omits_open_bounds() {
        let dsl = Query::range("date", None, Some("2002-06-21T00:00:00Z")).to_dsl();

        assert_eq!(dsl["range"]["date"]["lte"], "2002-06-21T00:00:00Z");
        assert!(dsl["range"]["date"].get("gte").is_none());
    }

    #[test]
    fn test_query_string_dsl_is_lenient() {
        let dsl = Query::text("ent*", &["entries", "date"]).to_dsl();

        assert_eq!(dsl["query_string"]["query"], "ent*");
        assert_eq!(dsl["query_string"]["fields"], json!(["entries", "date"]));
        assert_eq!(dsl["query_string"]["lenient"], true);
    }

    #[test]
    fn test_bool_dsl() {
        let dsl = Query::bool()
            .must(Query::term("email", "a@b.c"))
            .must_not(Query::exists("verify_token"))
            .build()
            .to_dsl();

        assert_eq!(dsl["bool"]["must"][0]["term"]["email"], "a@b.c");
        assert_eq!(dsl["bool"]["must_not"][0]["exists"]["field"], "verify_token");
        assert_eq!(dsl["bool"]["filter"], json!([]));
    }

    #[test]
    fn test_highlight_dsl_returns_whole_values() {
        let dsl = Highlight::new(&["entries"], "<strong>", "</strong>").to_dsl();

        assert_eq!(dsl["pre_tags"], json!(["<strong>"]));
        assert_eq!(dsl["fields"]["entries"]["number_of_fragments"], 0);
    }
}
