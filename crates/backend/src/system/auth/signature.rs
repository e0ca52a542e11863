//! Подписи вебхуков и сравнение статических токенов

use super::AuthError;
use ring::hmac;

/// Префикс заголовка `X-Winestro-Signature: sha256=<hex>`
const SIGNATURE_PREFIX: &str = "sha256=";

/// HMAC-SHA256 тела в hex
pub fn sign(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, body).as_ref())
}

/// Проверить подпись вебхука (сравнение в постоянном времени)
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), AuthError> {
    let header = header.map(str::trim).ok_or(AuthError::BadSignature)?;
    let hex_part = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);
    let signature = hex::decode(hex_part).map_err(|_| AuthError::BadSignature)?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, body, &signature).map_err(|_| AuthError::BadSignature)
}

/// Сравнение секретов без утечки по времени: сравниваются HMAC-теги,
/// `hmac::verify` делает это в постоянном времени
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, b"winestro-sync/token-compare");
    let expected_tag = hmac::sign(&key, expected.as_bytes());
    hmac::verify(&key, provided.as_bytes(), expected_tag.as_ref()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_roundtrip_and_tampering() {
        let body = br#"{"event":"product.updated","data":{"id":"X"}}"#;
        let signature = format!("sha256={}", sign("hook-secret", body));

        assert!(verify_signature("hook-secret", body, Some(&signature)).is_ok());
        assert!(verify_signature("hook-secret", b"{}", Some(&signature)).is_err());
        assert!(verify_signature("other", body, Some(&signature)).is_err());
        assert!(verify_signature("hook-secret", body, Some("sha256=zz")).is_err());
        assert!(verify_signature("hook-secret", body, None).is_err());
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("cron-token", "cron-token"));
        assert!(!tokens_match("cron-token", "cron-tokem"));
        assert!(!tokens_match("cron-token", "cron"));
    }
}
