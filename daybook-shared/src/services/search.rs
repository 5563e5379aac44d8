/// Journal search and writing streaks
///
/// # Search
///
/// Every search is scoped to one user and may add a lenient free-text clause
/// over the entry text and date, and an inclusive date range. Results come
/// back newest first. Entry lines that matched the text are returned with the
/// matches wrapped in `<strong>` tags.
///
/// # Streaks
///
/// A streak is the number of consecutive days with an entry, counting back
/// from the day before the reference date. Today never counts, so a streak is
/// not lost before the user has had a chance to write.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::journal::{format_date, start_of_day, JournalEntry, JournalQuery, SearchPage};
use crate::store::{
    BoolQuery, Collection, DocumentStore, Highlight, Query, SearchRequest, Sort,
};

/// Tag opening a highlighted match
pub const HIGHLIGHT_PRE_TAG: &str = "<strong>";

/// Tag closing a highlighted match
pub const HIGHLIGHT_POST_TAG: &str = "</strong>";

/// Page size used while collecting dates in [`SearchService::search_dates`]
pub const DATE_PAGE_SIZE: usize = 500;

/// Longest streak window examined, in days
pub const MAX_STREAK_DAYS: i64 = 3650;

lazy_static! {
    static ref HIGHLIGHT_TAG_RE: Regex = Regex::new(r"</?strong>").unwrap();
}

/// Search & Streak Engine
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
}

impl SearchService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Searches a user's journal
    ///
    /// `total` counts every match; the page holds at most `limit` of them.
    ///
    /// # Errors
    ///
    /// `UserUnauthorized` if `user_id` is empty
    pub async fn search(&self, user_id: &str, query: &JournalQuery) -> ServiceResult<SearchPage> {
        if user_id.is_empty() {
            return Err(ServiceError::UserUnauthorized);
        }

        let mut request = SearchRequest::new(build_filter(user_id, query))
            .sort(Sort::desc("date"))
            .highlight(Highlight::new(&["entries"], HIGHLIGHT_PRE_TAG, HIGHLIGHT_POST_TAG));

        if let Some(limit) = positive(query.limit) {
            request = request.size(limit);
        }
        if let Some(offset) = positive(query.offset) {
            request = request.from(offset);
        }

        let response = self.store.search(Collection::Journal, &request).await?;
        debug!(user_id = %user_id, total = response.total, returned = response.hits.len(), "Journal search");

        let entries = response
            .hits
            .into_iter()
            .map(|mut hit| -> ServiceResult<JournalEntry> {
                let fragments = hit.highlight.remove("entries");
                let mut entry = JournalEntry::from_hit(hit)?;
                if let Some(fragments) = fragments {
                    apply_highlights(&mut entry.entries, &fragments);
                }
                Ok(entry)
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(SearchPage {
            entries,
            total: response.total,
        })
    }

    /// Dates of a user's entries matching `query`
    ///
    /// Returns one `YYYY-MM-DDThh:mm:ssZ` string per matching entry, oldest
    /// first. Paging fields of `query` are ignored; every match is collected
    /// in pages of [`DATE_PAGE_SIZE`].
    ///
    /// # Errors
    ///
    /// `UserUnauthorized` if `user_id` is empty
    pub async fn search_dates(
        &self,
        user_id: &str,
        query: &JournalQuery,
    ) -> ServiceResult<Vec<String>> {
        if user_id.is_empty() {
            return Err(ServiceError::UserUnauthorized);
        }

        let filter = build_filter(user_id, query);
        let mut dates = Vec::new();
        let mut from = 0;

        loop {
            let request = SearchRequest::new(filter.clone())
                .source_fields(&["date"])
                .sort(Sort::asc("date"))
                .from(from)
                .size(DATE_PAGE_SIZE);

            let response = self.store.search(Collection::Journal, &request).await?;
            let returned = response.hits.len();
            dates.extend(
                response
                    .hits
                    .iter()
                    .filter_map(|hit| hit_date(&hit.source))
                    .map(format_date),
            );

            from += returned;
            if returned == 0 || from as u64 >= response.total {
                break;
            }
        }

        debug!(user_id = %user_id, count = dates.len(), "Journal date search");
        Ok(dates)
    }

    /// Consecutive days with an entry, ending the day before `as_of`
    ///
    /// At most `limit` days are examined. The walk stops at the first missing
    /// day.
    ///
    /// # Errors
    ///
    /// `UserUnauthorized` if `user_id` is empty
    pub async fn get_streak(
        &self,
        user_id: &str,
        as_of: DateTime<Utc>,
        limit: i64,
    ) -> ServiceResult<u32> {
        if user_id.is_empty() {
            return Err(ServiceError::UserUnauthorized);
        }
        if limit < 1 {
            return Ok(0);
        }
        let limit = limit.min(MAX_STREAK_DAYS);

        let yesterday = start_of_day(as_of) - Duration::days(1);
        let lower_bound = yesterday - Duration::days(limit - 1);

        let request = SearchRequest::new(
            Query::bool()
                .must(Query::term("user_id", user_id))
                .filter(Query::range(
                    "date",
                    Some(format_date(lower_bound)),
                    Some(format_date(yesterday)),
                ))
                .build(),
        )
        .sort(Sort::desc("date"))
        .source_fields(&["date"])
        .size(limit as usize);

        let response = self.store.search(Collection::Journal, &request).await?;
        let dates: Vec<DateTime<Utc>> = response
            .hits
            .iter()
            .filter_map(|hit| hit_date(&hit.source))
            .collect();

        let streak = count_streak(yesterday, &dates);
        debug!(user_id = %user_id, streak, "Computed streak");
        Ok(streak)
    }
}

fn positive(value: Option<i64>) -> Option<usize> {
    value.filter(|v| *v > 0).map(|v| v as usize)
}

/// Query shared by search and date search
fn build_filter(user_id: &str, query: &JournalQuery) -> Query {
    let mut filter: BoolQuery = Query::bool().must(Query::term("user_id", user_id));

    if let Some(text) = query.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        filter = filter.must(Query::text(text, &["entries", "date"]));
    }

    if query.start.is_some() || query.end.is_some() {
        let bound = |at: Option<DateTime<Utc>>| -> Option<Value> {
            at.map(|at| json!(format_date(start_of_day(at))))
        };
        filter = filter.filter(Query::Range {
            field: "date".to_string(),
            gte: bound(query.start),
            lte: bound(query.end),
        });
    }

    filter.build()
}

fn hit_date(source: &Value) -> Option<DateTime<Utc>> {
    let raw = source.get("date")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Substitutes each line with the fragment that highlights it
fn apply_highlights(entries: &mut [String], fragments: &[String]) {
    for fragment in fragments {
        let plain = HIGHLIGHT_TAG_RE.replace_all(fragment, "");
        if let Some(entry) = entries.iter_mut().find(|entry| **entry == plain) {
            *entry = fragment.clone();
        }
    }
}

/// Walks newest-first dates back from `yesterday` until the first gap
fn count_streak(yesterday: DateTime<Utc>, dates: &[DateTime<Utc>]) -> u32 {
    let mut current = yesterday;
    let mut streak = 0;

    for date in dates {
        if *date != current {
            break;
        }
        streak += 1;
        current -= Duration::days(1);
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_count_streak_stops_at_gap() {
        let yesterday = day(2024, 3, 10);
        let dates = [day(2024, 3, 10), day(2024, 3, 9), day(2024, 3, 7), day(2024, 3, 6)];

        assert_eq!(count_streak(yesterday, &dates), 2);
    }

    #[test]
    fn test_count_streak_requires_yesterday() {
        let yesterday = day(2024, 3, 10);

        assert_eq!(count_streak(yesterday, &[day(2024, 3, 9), day(2024, 3, 8)]), 0);
        assert_eq!(count_streak(yesterday, &[]), 0);
    }

    #[test]
    fn test_apply_highlights_substitutes_matching_lines() {
        let mut entries = vec!["test entry 1".to_string(), "other".to_string()];
        apply_highlights(&mut entries, &["<strong>test</strong> entry 1".to_string()]);

        assert_eq!(entries, vec!["<strong>test</strong> entry 1", "other"]);
    }

    #[test]
    fn test_apply_highlights_ignores_unknown_fragments() {
        let mut entries = vec!["one".to_string()];
        apply_highlights(&mut entries, &["<strong>two</strong>".to_string()]);

        assert_eq!(entries, vec!["one"]);
    }

    #[test]
    fn test_build_filter_open_ended_range() {
        let query = JournalQuery {
            start: Some(Utc.with_ymd_and_hms(2002, 4, 21, 15, 0, 0).unwrap()),
            ..Default::default()
        };

        let dsl = build_filter("u1", &query).to_dsl();
        assert_eq!(dsl["bool"]["filter"][0]["range"]["date"]["gte"], "2002-04-21T00:00:00Z");
        assert!(dsl["bool"]["filter"][0]["range"]["date"].get("lte").is_none());
        assert_eq!(dsl["bool"]["must"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_build_filter_with_text() {
        let query = JournalQuery {
            query: Some(" ent* ".to_string()),
            ..Default::default()
        };

        let dsl = build_filter("u1", &query).to_dsl();
        assert_eq!(dsl["bool"]["must"][1]["query_string"]["query"], "ent*");
        assert_eq!(dsl["bool"]["must"][1]["query_string"]["lenient"], true);
        assert_eq!(dsl["bool"]["filter"], json!([]));
    }

    #[test]
    fn test_positive() {
        assert_eq!(positive(Some(2)), Some(2));
        assert_eq!(positive(Some(0)), None);
        assert_eq!(positive(Some(-3)), None);
        assert_eq!(positive(None), None);
    }
}
