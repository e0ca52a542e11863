pub mod handlers;

use crate::domain::a001_product::ProductRepository;
use crate::shared::config::SecurityConfig;
use crate::system::auth::AuthError;
use crate::usecases::u501_sync_from_winestro::{SyncError, SyncExecutor};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use thiserror::Error;

/// Общее состояние HTTP-обработчиков
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<SyncExecutor>,
    pub products: ProductRepository,
    pub db: DatabaseConnection,
    pub security: Arc<SecurityConfig>,
}

/// Ошибка обработчика → `{success: false, code, error}` с HTTP-статусом
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Sync(SyncError::Erp(_)) => (StatusCode::BAD_GATEWAY, "erp_unavailable"),
            ApiError::Sync(SyncError::StoreUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            ApiError::Sync(SyncError::Store(_)) => (StatusCode::SERVICE_UNAVAILABLE, "store_error"),
            ApiError::Sync(SyncError::InvalidRequest(_)) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Auth(e) => (e.status(), "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Auth(e) => return e.into_response(),
            other => other,
        };
        let (status, code) = err.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, err);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, err);
        }
        let body = serde_json::json!({
            "success": false,
            "code": code,
            "error": err.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
