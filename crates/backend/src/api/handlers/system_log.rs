use axum::{
    extract::{Query, State},
    Json,
};
use contracts::shared::logger::LogEntry;
use serde::Deserialize;

use crate::api::{ApiError, AppState};
use crate::shared::logger::repository::list_recent;

const MAX_LOG_ENTRIES: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub category: Option<String>,
    pub limit: Option<u64>,
}

/// GET /api/admin/logs
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(100).min(MAX_LOG_ENTRIES);
    let entries = list_recent(&state.db, query.category.as_deref(), limit).await?;
    Ok(Json(entries))
}
