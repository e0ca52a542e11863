use super::winestro_models::{article_id_of, looks_like_article};
use crate::shared::config::{CredentialPlacement, WinestroConfig};
use crate::shared::format::truncate_for_log;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Ключи-обёртки, под которыми Winestro отдаёт список артикулов
pub const ARTICLE_LIST_KEYS: &[&str] = &["artikel", "articles", "data", "items"];
/// Ключи-обёртки списка остатков
pub const STOCK_LIST_KEYS: &[&str] = &["bestand", "stock", "data", "items"];

const ERROR_KEYS: &[&str] = &["error", "fehler", "errormsg"];
const MAX_BODY_IN_ERROR: usize = 300;

#[derive(Debug, Error)]
pub enum WinestroError {
    #[error("Winestro unreachable: {0}")]
    Transport(String),

    #[error("Winestro returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed Winestro response: {0}")]
    Parse(String),

    #[error("Winestro reported an error: {0}")]
    Api(String),

    #[error("Winestro client misconfigured: {0}")]
    Config(String),
}

/// Действие API (`apiACTION`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinestroAction {
    GetArticles,
    GetArticle(String),
    GetStock,
}

impl WinestroAction {
    pub fn api_name(&self) -> &'static str {
        match self {
            WinestroAction::GetArticles => "getArtikel",
            WinestroAction::GetArticle(_) => "getArtikelinfo",
            WinestroAction::GetStock => "getBestand",
        }
    }

    fn article_id(&self) -> Option<&str> {
        match self {
            WinestroAction::GetArticle(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Источник артикулов для синхронизации.
///
/// Записи отдаются как сырой JSON: битая запись должна стать ошибкой
/// одного товара, а не всего прогона.
#[async_trait]
pub trait ErpSource: Send + Sync {
    /// Имя источника для логов
    fn name(&self) -> &'static str;

    async fn fetch_articles(&self) -> Result<Vec<Value>, WinestroError>;

    /// `None` — артикул не найден
    async fn fetch_article(&self, article_id: &str) -> Result<Option<Value>, WinestroError>;

    async fn fetch_stock(&self) -> Result<Vec<Value>, WinestroError>;

    /// Проверка доступа только на чтение. Возвращает число артикулов
    async fn probe(&self) -> Result<usize, WinestroError> {
        Ok(self.fetch_articles().await?.len())
    }
}

/// HTTP-клиент Winestro (wbo-API.php)
pub struct WinestroApiClient {
    client: reqwest::Client,
    config: WinestroConfig,
}

impl WinestroApiClient {
    pub fn new(config: WinestroConfig) -> Result<Self, WinestroError> {
        if config.base_url.trim().is_empty() {
            return Err(WinestroError::Config("winestro.base_url is empty".to_string()));
        }
        if config.uid.trim().is_empty() || config.api_code.trim().is_empty() {
            tracing::warn!("Winestro credentials are incomplete (uid or api_code empty)");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WinestroError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Собрать запрос с учётными данными (в заголовках или в query)
    pub fn build_request(&self, action: &WinestroAction) -> Result<reqwest::Request, WinestroError> {
        let cfg = &self.config;
        let mut query: Vec<(&str, String)> = vec![
            ("apiACTION", action.api_name().to_string()),
            ("output", "json".to_string()),
        ];
        if let Some(id) = action.article_id() {
            query.push(("artikelnr", id.to_string()));
        }

        let credentials = [
            ("X-Winestro-Uid", "UID", &cfg.uid),
            ("X-Winestro-User", "apiUSER", &cfg.api_user),
            ("X-Winestro-Code", "apiCODE", &cfg.api_code),
            ("X-Winestro-Shop", "apiShopID", &cfg.shop_id),
        ];

        let mut builder = self
            .client
            .get(cfg.base_url.trim())
            .header(ACCEPT, "application/json");

        for (header, param, value) in credentials {
            if value.trim().is_empty() {
                continue;
            }
            match cfg.credentials {
                CredentialPlacement::Header => builder = builder.header(header, value.trim()),
                CredentialPlacement::Query => query.push((param, value.trim().to_string())),
            }
        }

        builder
            .query(&query)
            .build()
            .map_err(|e| WinestroError::Config(e.without_url().to_string()))
    }

    async fn call(&self, action: WinestroAction) -> Result<Value, WinestroError> {
        let request = self.build_request(&action)?;
        // URL не логируется: в режиме query в нём учётные данные
        tracing::info!(
            "Winestro API: {}{}",
            action.api_name(),
            action
                .article_id()
                .map(|id| format!(" artikelnr={}", id))
                .unwrap_or_default()
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| WinestroError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WinestroError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            tracing::warn!("Winestro API {} responded with {}", action.api_name(), status);
            return Err(WinestroError::Http {
                status: status.as_u16(),
                body: truncate_for_log(&body, MAX_BODY_IN_ERROR),
            });
        }

        parse_body(&body)
    }
}

#[async_trait]
impl ErpSource for WinestroApiClient {
    fn name(&self) -> &'static str {
        "winestro"
    }

    async fn fetch_articles(&self) -> Result<Vec<Value>, WinestroError> {
        let body = self.call(WinestroAction::GetArticles).await?;
        let items = extract_list(body, ARTICLE_LIST_KEYS)?;
        tracing::info!("Winestro API: got {} articles", items.len());
        Ok(items)
    }

    async fn fetch_article(&self, article_id: &str) -> Result<Option<Value>, WinestroError> {
        let body = self
            .call(WinestroAction::GetArticle(article_id.to_string()))
            .await?;
        // запись без номера артикула считается запрошенной
        let found = extract_list(body, ARTICLE_LIST_KEYS)?
            .into_iter()
            .find(|item| article_id_of(item).map_or(true, |id| id == article_id));
        if found.is_none() {
            tracing::debug!("getArtikelinfo returned no record for {}", article_id);
        }
        Ok(found)
    }

    async fn fetch_stock(&self) -> Result<Vec<Value>, WinestroError> {
        let body = self.call(WinestroAction::GetStock).await?;
        extract_list(body, STOCK_LIST_KEYS)
    }
}

/// Разобрать тело ответа как JSON
pub fn parse_body(body: &str) -> Result<Value, WinestroError> {
    serde_json::from_str(body).map_err(|e| {
        WinestroError::Parse(format!(
            "{} (body: {})",
            e,
            truncate_for_log(body, MAX_BODY_IN_ERROR)
        ))
    })
}

/// Достать список записей из ответа.
///
/// Голый массив и обёртка `{artikel: [...]}` равнозначны. Под обёрткой
/// может лежать PHP-массив в виде объекта `{"0": {...}, "1": {...}}`
/// или одиночная запись.
pub fn extract_list(body: Value, wrapper_keys: &[&str]) -> Result<Vec<Value>, WinestroError> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            if let Some(message) = error_message(&obj) {
                return Err(WinestroError::Api(message));
            }
            for key in wrapper_keys {
                match obj.remove(*key) {
                    Some(Value::Array(items)) => return Ok(items),
                    Some(Value::Object(inner)) if looks_like_article(&inner) => {
                        return Ok(vec![Value::Object(inner)])
                    }
                    Some(Value::Object(inner)) => return Ok(php_array_values(inner)),
                    Some(Value::Null) => return Ok(Vec::new()),
                    Some(other) => {
                        return Err(WinestroError::Parse(format!(
                            "'{}' holds {} instead of a list",
                            key,
                            truncate_for_log(&other.to_string(), 60)
                        )))
                    }
                    None => {}
                }
            }
            if looks_like_article(&obj) {
                return Ok(vec![Value::Object(obj)]);
            }
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            Err(WinestroError::Parse(format!(
                "unexpected response object with keys [{}]",
                keys.join(", ")
            )))
        }
        other => Err(WinestroError::Parse(format!(
            "unexpected response: {}",
            truncate_for_log(&other.to_string(), 60)
        ))),
    }
}

/// Значения PHP-массива `{"0": .., "1": .., "10": ..}` в порядке индексов.
/// `Map` хранит ключи отсортированными как строки ("10" раньше "2")
fn php_array_values(obj: serde_json::Map<String, Value>) -> Vec<Value> {
    let mut entries: Vec<(String, Value)> = obj.into_iter().collect();
    entries.sort_by_key(|(key, _)| (key.parse::<u64>().unwrap_or(u64::MAX), key.clone()));
    entries.into_iter().map(|(_, value)| value).collect()
}

fn error_message(obj: &serde_json::Map<String, Value>) -> Option<String> {
    ERROR_KEYS.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Bool(true) => Some("unspecified error".to_string()),
        Value::Object(inner) => Some(Value::Object(inner.clone()).to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::test_config;
    use serde_json::json;

    fn config(placement: CredentialPlacement) -> WinestroConfig {
        let mut cfg = test_config().winestro;
        cfg.base_url = "https://weinstro.de/wbo-API.php".to_string();
        cfg.uid = "1234".to_string();
        cfg.api_user = "shop".to_string();
        cfg.api_code = "secret-code".to_string();
        cfg.shop_id = "1".to_string();
        cfg.credentials = placement;
        cfg
    }

    fn query_pairs(request: &reqwest::Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_credentials_go_to_headers_by_default() {
        let client = WinestroApiClient::new(config(CredentialPlacement::Header)).unwrap();
        let request = client
            .build_request(&WinestroAction::GetArticle("A100".to_string()))
            .unwrap();

        let pairs = query_pairs(&request);
        assert!(pairs.contains(&("apiACTION".to_string(), "getArtikelinfo".to_string())));
        assert!(pairs.contains(&("output".to_string(), "json".to_string())));
        assert!(pairs.contains(&("artikelnr".to_string(), "A100".to_string())));
        assert!(!request.url().as_str().contains("secret-code"));

        let headers = request.headers();
        assert_eq!(headers["X-Winestro-Uid"], "1234");
        assert_eq!(headers["X-Winestro-Code"], "secret-code");
        assert_eq!(headers["X-Winestro-Shop"], "1");
    }

    #[test]
    fn test_legacy_query_credentials() {
        let client = WinestroApiClient::new(config(CredentialPlacement::Query)).unwrap();
        let request = client.build_request(&WinestroAction::GetStock).unwrap();

        let pairs = query_pairs(&request);
        assert!(pairs.contains(&("apiACTION".to_string(), "getBestand".to_string())));
        assert!(pairs.contains(&("UID".to_string(), "1234".to_string())));
        assert!(pairs.contains(&("apiUSER".to_string(), "shop".to_string())));
        assert!(pairs.contains(&("apiCODE".to_string(), "secret-code".to_string())));
        assert!(pairs.contains(&("apiShopID".to_string(), "1".to_string())));
        assert!(request.headers().get("X-Winestro-Uid").is_none());
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let mut cfg = config(CredentialPlacement::Header);
        cfg.base_url = " ".to_string();
        assert!(matches!(
            WinestroApiClient::new(cfg),
            Err(WinestroError::Config(_))
        ));
    }

    #[test]
    fn test_bare_array_and_wrapper_are_equivalent() {
        let items = json!([
            {"artikelnr": "A1", "name": "Riesling"},
            {"artikelnr": "A2", "name": "Dornfelder"}
        ]);
        let bare = extract_list(items.clone(), ARTICLE_LIST_KEYS).unwrap();
        for key in ARTICLE_LIST_KEYS {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(key.to_string(), items.clone());
            let wrapped = extract_list(Value::Object(wrapper), ARTICLE_LIST_KEYS).unwrap();
            assert_eq!(wrapped, bare, "wrapper key {}", key);
        }
    }

    #[test]
    fn test_php_style_object_and_single_record() {
        let list = extract_list(
            json!({"artikel": {"0": {"artikelnr": "A1"}, "1": {"artikelnr": "A2"}}}),
            ARTICLE_LIST_KEYS,
        )
        .unwrap();
        assert_eq!(list.len(), 2);

        let ordered = extract_list(
            json!({"artikel": {
                "0": {"artikelnr": "A0"},
                "10": {"artikelnr": "A10"},
                "2": {"artikelnr": "A2"}
            }}),
            ARTICLE_LIST_KEYS,
        )
        .unwrap();
        let ids: Vec<String> = ordered.iter().filter_map(article_id_of).collect();
        assert_eq!(ids, vec!["A0", "A2", "A10"]);

        let single = extract_list(json!({"artikelnr": "A1", "name": "Riesling"}), ARTICLE_LIST_KEYS)
            .unwrap();
        assert_eq!(single.len(), 1);

        let wrapped_single = extract_list(json!({"data": {"artikelnr": "A1"}}), ARTICLE_LIST_KEYS)
            .unwrap();
        assert_eq!(wrapped_single.len(), 1);

        assert!(extract_list(Value::Null, ARTICLE_LIST_KEYS).unwrap().is_empty());
    }

    #[test]
    fn test_error_object_and_garbage() {
        let err = extract_list(json!({"fehler": "apiCODE ungültig"}), ARTICLE_LIST_KEYS).unwrap_err();
        assert!(matches!(err, WinestroError::Api(ref m) if m == "apiCODE ungültig"));

        let err = extract_list(json!({"foo": 1}), ARTICLE_LIST_KEYS).unwrap_err();
        assert!(matches!(err, WinestroError::Parse(_)));

        let err = extract_list(json!("oops"), ARTICLE_LIST_KEYS).unwrap_err();
        assert!(matches!(err, WinestroError::Parse(_)));

        assert!(matches!(parse_body("<html>"), Err(WinestroError::Parse(_))));
    }

    #[tokio::test]
    async fn test_http_error_becomes_transport_error() {
        use axum::{http::StatusCode, routing::get, Router};

        let app = Router::new().route(
            "/wbo-API.php",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "wartung") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut cfg = config(CredentialPlacement::Header);
        cfg.base_url = format!("http://{}/wbo-API.php", addr);
        let client = WinestroApiClient::new(cfg).unwrap();

        let err = client.fetch_articles().await.unwrap_err();
        assert!(matches!(err, WinestroError::Http { status: 503, ref body } if body == "wartung"));
    }

    #[tokio::test]
    async fn test_wrapped_response_over_http() {
        use axum::{routing::get, Json, Router};

        let app = Router::new().route(
            "/wbo-API.php",
            get(|| async {
                Json(json!({"artikel": [{"artikelnr": "A100", "name": "Riesling 2022"}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut cfg = config(CredentialPlacement::Header);
        cfg.base_url = format!("http://{}/wbo-API.php", addr);
        let client = WinestroApiClient::new(cfg).unwrap();

        let items = client.fetch_articles().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(client.probe().await.unwrap(), 1);
        assert!(client.fetch_article("A100").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fetch_article_ignores_other_articles() {
        use axum::{routing::get, Json, Router};

        let app = Router::new().route(
            "/wbo-API.php",
            get(|| async {
                Json(json!({"artikel": [
                    {"artikelnr": "A100", "name": "Riesling 2022", "preis": 12.5},
                    {"artikelnr": "X", "name": "Grauburgunder", "preis": "11,90"}
                ]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut cfg = config(CredentialPlacement::Header);
        cfg.base_url = format!("http://{}/wbo-API.php", addr);
        let client = WinestroApiClient::new(cfg).unwrap();

        let found = client.fetch_article("X").await.unwrap().unwrap();
        assert_eq!(article_id_of(&found).as_deref(), Some("X"));
        assert!(client.fetch_article("B7").await.unwrap().is_none());
    }
}
