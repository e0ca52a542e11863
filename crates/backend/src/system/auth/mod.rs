pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod signature;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("admin role required")]
    Forbidden,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("invalid webhook signature")]
    BadSignature,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::warn!("Request rejected: {}", self);
        let body = serde_json::json!({
            "success": false,
            "code": "unauthorized",
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Токен из заголовка `Authorization: Bearer <token>`
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}
