use super::{bearer_token, jwt, AuthError};
use crate::api::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware: валидный JWT с ролью `admin`.
/// Claims кладутся в extensions запроса для `CurrentUser`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let secret = state
        .security
        .jwt_secret
        .as_deref()
        .ok_or(AuthError::NotConfigured("security.jwt_secret"))?;

    let token = bearer_token(req.headers())?;
    let claims = jwt::validate_token(token, secret)?;

    if !claims.role.is_admin() {
        tracing::warn!("User '{}' tried to access an admin route", claims.sub);
        return Err(AuthError::Forbidden);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
