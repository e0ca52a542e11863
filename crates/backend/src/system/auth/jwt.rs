use super::AuthError;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, DecodingKey, Validation};

/// Проверить JWT админки и вернуть claims.
///
/// Токены выпускает внешний сервис авторизации, здесь только проверка
/// подписи (HS256) и срока действия.
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
pub(crate) fn issue_test_token(
    secret: &str,
    role: contracts::system::auth::UserRole,
    lifetime_secs: i64,
) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = TokenClaims {
        sub: "user-1".to_string(),
        username: "tester".to_string(),
        role,
        exp: (now + lifetime_secs).max(0) as usize,
        iat: now as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
