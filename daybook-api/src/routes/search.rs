/// Search and streak endpoints
///
/// # Endpoints
///
/// - `POST /api/search` - Entries matching text and/or a date range, newest first
/// - `POST /api/search/date` - Just the dates of matching entries
/// - `GET  /api/streak/:date` - Days in a row written before `date`
///
/// # Search Request
///
/// ```json
/// {
///   "query": "run*",
///   "start": "2024-01-01",
///   "end": "2024-01-31",
///   "limit": 10,
///   "offset": 0
/// }
/// ```
///
/// Every field is optional.

use crate::{
    app::{AppState, AuthContext},
    error::ApiResult,
    routes::{journal::date_param, ApiResponse},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use daybook_shared::models::journal::{JournalEntry, JournalQuery};
use serde::Deserialize;
use validator::Validate;

/// Longest streak reported
pub const STREAK_LIMIT: i64 = 10;

/// Search request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SearchJournalRequest {
    #[validate(length(max = 256, message = "Query must be at most 256 characters"))]
    pub query: Option<String>,

    pub start: Option<String>,
    pub end: Option<String>,

    #[validate(range(max = 1000, message = "Limit must be at most 1000"))]
    pub limit: Option<i64>,

    pub offset: Option<i64>,
}

impl SearchJournalRequest {
    fn into_query(self) -> ApiResult<JournalQuery> {
        self.validate()?;

        Ok(JournalQuery {
            start: self.start.as_deref().map(date_param).transpose()?,
            end: self.end.as_deref().map(date_param).transpose()?,
            query: self.query,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Returns `{result: [entries], total}`; `total` counts all pages
pub async fn search(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SearchJournalRequest>,
) -> ApiResult<Json<ApiResponse<Vec<JournalEntry>>>> {
    let query = req.into_query()?;
    let page = state.services.search.search(&auth.user_id, &query).await?;

    Ok(Json(ApiResponse::page(page.entries, page.total)))
}

pub async fn search_dates(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SearchJournalRequest>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let query = req.into_query()?;
    let dates = state
        .services
        .search
        .search_dates(&auth.user_id, &query)
        .await?;

    Ok(Json(ApiResponse::ok(dates)))
}

pub async fn streak(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(date): Path<String>,
) -> ApiResult<Json<ApiResponse<u32>>> {
    let as_of = date_param(&date)?;
    let streak = state
        .services
        .search
        .get_streak(&auth.user_id, as_of, STREAK_LIMIT)
        .await?;

    Ok(Json(ApiResponse::ok(streak)))
}
