use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use contracts::usecases::u501_sync_from_winestro::{
    SyncTrigger, WebhookEvent, WebhookPayload, WebhookResponse,
};

use crate::api::{ApiError, AppState};
use crate::system::auth::signature::verify_signature;

pub const SIGNATURE_HEADER: &str = "X-Winestro-Signature";

/// POST /api/webhooks/winestro
///
/// `product.created` / `product.updated` → синхронизация одного артикула,
/// `product.deleted` → снятие с продажи, остальное игнорируется.
pub async fn winestro(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    match state.security.webhook_secret.as_deref() {
        Some(secret) => {
            let signature = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok());
            verify_signature(secret, &body, signature)?;
        }
        None => tracing::warn!("Webhook signature not checked: security.webhook_secret is not set"),
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {}", e)))?;
    tracing::info!("Winestro webhook: {} {:?}", payload.event, payload.data.id);

    let respond = |action: &str, result| WebhookResponse {
        received: true,
        event: payload.event.clone(),
        action: action.to_string(),
        result,
    };

    match payload.event_kind() {
        WebhookEvent::ProductCreated | WebhookEvent::ProductUpdated => {
            let article_id = payload
                .article_id()
                .ok_or_else(|| ApiError::BadRequest("data.id is required".to_string()))?;
            let result = state
                .executor
                .sync_single_product(&article_id, SyncTrigger::Webhook)
                .await?;
            let action = if result.success { "synced" } else { "failed" };
            Ok(Json(respond(action, Some(result))))
        }
        WebhookEvent::ProductDeleted => {
            let article_id = payload
                .article_id()
                .ok_or_else(|| ApiError::BadRequest("data.id is required".to_string()))?;
            let action = match state.executor.archive_product(&article_id).await? {
                Some(_) => "archived",
                None => "not_found",
            };
            Ok(Json(respond(action, None)))
        }
        WebhookEvent::Other(event) => {
            tracing::debug!("Webhook event '{}' ignored", event);
            Ok(Json(respond("ignored", None)))
        }
    }
}
