use serde::{Deserialize, Serialize};

/// Роль пользователя магазина
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Claims JWT-токена, выданного сервисом авторизации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String, // user_id
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    pub exp: usize, // expiration timestamp
    #[serde(default)]
    pub iat: usize, // issued at
}
