/// Journal entry endpoints
///
/// # Endpoints
///
/// - `POST   /api/journal` - Write the entry for a day (today by default)
/// - `GET    /api/journal/:date` - Entry for a day (`YYYY-MM-DD` or RFC 3339)
/// - `PUT    /api/journal/:id` - Replace an entry's lines
/// - `DELETE /api/journal/:id` - Remove an entry

use crate::{
    app::{AppState, AuthContext},
    error::{ApiError, ApiResult},
    routes::ApiResponse,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use daybook_shared::models::journal::{parse_date, JournalEntry};
use serde::Deserialize;

/// Create entry request
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// Day to write for; defaults to today
    pub date: Option<String>,
    pub entries: Vec<String>,
}

/// Modify entry request
#[derive(Debug, Deserialize)]
pub struct ModifyEntryRequest {
    pub entries: Vec<String>,
}

/// Parses a date from a path or body, as a 400 on failure
pub(crate) fn date_param(raw: &str) -> ApiResult<DateTime<Utc>> {
    parse_date(raw).ok_or_else(|| {
        ApiError::BadRequest(format!("'{}' is not a date (expected YYYY-MM-DD)", raw))
    })
}

/// # Errors
///
/// - `409`: An entry for that day already exists
/// - `422`: Too many, empty or overlong lines
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEntryRequest>,
) -> ApiResult<Json<ApiResponse<JournalEntry>>> {
    let date = match req.date.as_deref() {
        Some(raw) => date_param(raw)?,
        None => Utc::now(),
    };

    let entry = state
        .services
        .journal
        .create(&auth.user_id, &req.entries, date)
        .await?;

    Ok(Json(ApiResponse::ok(entry)))
}

/// # Errors
///
/// - `400`: Unparseable date
/// - `404`: No entry for that day
pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(date): Path<String>,
) -> ApiResult<Json<ApiResponse<JournalEntry>>> {
    let date = date_param(&date)?;
    let entry = state.services.journal.get_by_date(&auth.user_id, date).await?;

    Ok(Json(ApiResponse::ok(entry)))
}

/// # Errors
///
/// - `404`: Missing entry, or one owned by another user
/// - `422`: Too many, empty or overlong lines
pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<ModifyEntryRequest>,
) -> ApiResult<Json<ApiResponse<JournalEntry>>> {
    let entry = state
        .services
        .journal
        .update(&id, &auth.user_id, &req.entries)
        .await?;

    Ok(Json(ApiResponse::ok(entry)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.journal.delete(&id, &auth.user_id).await?;
    Ok(Json(ApiResponse::empty()))
}
