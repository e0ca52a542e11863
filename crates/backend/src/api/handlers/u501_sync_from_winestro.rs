use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use contracts::usecases::u501_sync_from_winestro::{
    SyncOptions, SyncPhase, SyncProgress, SyncRequest, SyncResponse, SyncResult, SyncTrigger,
};
use serde::Serialize;

use crate::api::{ApiError, AppState};
use crate::system::auth::extractor::CurrentUser;
use crate::system::auth::signature::tokens_match;
use crate::system::auth::{bearer_token, AuthError};

#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    pub phase: SyncPhase,
    pub source: &'static str,
    pub progress: Option<SyncProgress>,
}

/// POST /api/admin/sync
pub async fn run_sync(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::info!(
        "Admin '{}' requested {:?} ({:?})",
        claims.username,
        request.action,
        request.options
    );

    let response = state.executor.execute(&request, SyncTrigger::Admin).await?;
    Ok(Json(response))
}

/// GET /api/admin/sync/status
pub async fn status(State(state): State<AppState>) -> Json<SyncStatusResponse> {
    let progress = state.executor.latest_progress();
    Json(SyncStatusResponse {
        phase: progress.as_ref().map(|p| p.phase).unwrap_or(SyncPhase::Idle),
        source: state.executor.source_name(),
        progress,
    })
}

/// GET /api/admin/sync/:session_id/progress
pub async fn get_progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SyncProgress>, ApiError> {
    state
        .executor
        .get_progress(&session_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("sync session {} not found", session_id)))
}

/// POST /api/cron/sync
///
/// Внешний планировщик: `Authorization: Bearer <security.cron_secret>`.
/// Тело необязательно: пустое тело — параметры по умолчанию,
/// иначе это должен быть корректный `SyncOptions`.
pub async fn cron_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SyncResult>, ApiError> {
    let expected = state
        .security
        .cron_secret
        .as_deref()
        .ok_or(AuthError::NotConfigured("security.cron_secret"))?;
    let provided = bearer_token(&headers)?;
    if !tokens_match(expected, provided) {
        return Err(AuthError::InvalidToken("cron token mismatch".to_string()).into());
    }

    let options = parse_cron_options(&body)?;
    let result = state
        .executor
        .sync_products(&options, SyncTrigger::Cron)
        .await?;
    Ok(Json(result))
}

fn parse_cron_options(body: &[u8]) -> Result<SyncOptions, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SyncOptions::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid sync options: {}", e)))
}
