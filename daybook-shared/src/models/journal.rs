/// Journal entry model
///
/// One document per user per calendar day in the `journal` collection. The
/// `date` is always UTC midnight of that day.
///
/// # Document
///
/// ```json
/// {
///   "user_id": "9f86d0...",
///   "entries": ["Went for a run", "Finished the book"],
///   "date": "2002-05-20T00:00:00Z",
///   "create_date": "2002-05-20T21:13:02Z"
/// }
/// ```

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, SearchHit, StoreError, Version};

/// Persisted shape of a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDocument {
    pub user_id: String,
    pub entries: Vec<String>,
    pub date: DateTime<Utc>,
    pub create_date: DateTime<Utc>,
}

/// A journal entry as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub entries: Vec<String>,
    pub date: DateTime<Utc>,
    pub create_date: DateTime<Utc>,
    #[serde(skip)]
    pub version: Option<Version>,
}

impl JournalEntry {
    fn from_parts(
        id: String,
        version: Version,
        source: serde_json::Value,
    ) -> Result<Self, StoreError> {
        let doc: JournalDocument = serde_json::from_value(source)?;

        Ok(Self {
            id,
            user_id: doc.user_id,
            entries: doc.entries,
            date: doc.date,
            create_date: doc.create_date,
            version: Some(version),
        })
    }

    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        Self::from_parts(doc.id, doc.version, doc.source)
    }

    pub fn from_hit(hit: SearchHit) -> Result<Self, StoreError> {
        Self::from_parts(hit.id, hit.version, hit.source)
    }
}

/// Parameters of a journal search
///
/// `limit` and `offset` only apply when positive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub entries: Vec<JournalEntry>,
    /// Matches across all pages
    pub total: u64,
}

/// UTC midnight of the day containing `at`
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    day_start(at.date_naive())
}

/// UTC midnight of `day`
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Renders a timestamp the way dates are stored and returned,
/// `YYYY-MM-DDThh:mm:ssZ`
pub fn format_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a calendar day or a full RFC 3339 timestamp
///
/// # Example
///
/// ```
/// use daybook_shared::models::journal::{format_date, parse_date};
///
/// let day = parse_date("2002-05-20").unwrap();
/// assert_eq!(format_date(day), "2002-05-20T00:00:00Z");
///
/// let at = parse_date("2002-05-20T23:30:00-02:00").unwrap();
/// assert_eq!(format_date(at), "2002-05-21T01:30:00Z");
///
/// assert!(parse_date("yesterday").is_none());
/// ```
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(day_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_start_of_day_truncates_time() {
        let at = Utc.with_ymd_and_hms(2002, 5, 20, 17, 45, 12).unwrap();

        assert_eq!(start_of_day(at), Utc.with_ymd_and_hms(2002, 5, 20, 0, 0, 0).unwrap());
        assert_eq!(start_of_day(start_of_day(at)), start_of_day(at));
    }

    #[test]
    fn test_format_date_matches_stored_form() {
        let day = Utc.with_ymd_and_hms(2002, 5, 20, 0, 0, 0).unwrap();

        assert_eq!(format_date(day), "2002-05-20T00:00:00Z");
        // Stored documents serialize dates the same way
        assert_eq!(json!(day), json!("2002-05-20T00:00:00Z"));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("2002-13-01").is_none());
    }

    #[test]
    fn test_entry_from_hit() {
        let hit = SearchHit {
            id: "e1".to_string(),
            version: Version {
                seq_no: 1,
                primary_term: 1,
            },
            source: json!({
                "user_id": "u1",
                "entries": ["one", "two"],
                "date": "2002-05-20T00:00:00Z",
                "create_date": "2002-05-20T09:00:00Z",
            }),
            highlight: Default::default(),
        };

        let entry = JournalEntry::from_hit(hit).unwrap();
        assert_eq!(entry.entries, vec!["one", "two"]);
        assert_eq!(format_date(entry.date), "2002-05-20T00:00:00Z");

        let rendered = serde_json::to_value(&entry).unwrap();
        assert!(rendered.get("version").is_none());
        assert_eq!(rendered["id"], "e1");
    }
}
