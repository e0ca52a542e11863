use super::response::SingleProductSyncResult;
use serde::{Deserialize, Serialize};

/// Тело вебхука Winestro: `{event, data: {id}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookData {
    /// Номер артикула; Winestro присылает то строку, то число
    #[serde(default)]
    pub id: serde_json::Value,
}

impl WebhookPayload {
    pub fn event_kind(&self) -> WebhookEvent {
        WebhookEvent::parse(&self.event)
    }

    pub fn article_id(&self) -> Option<String> {
        match &self.data.id {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    Other(String),
}

impl WebhookEvent {
    pub fn parse(s: &str) -> Self {
        match s {
            "product.created" => WebhookEvent::ProductCreated,
            "product.updated" => WebhookEvent::ProductUpdated,
            "product.deleted" => WebhookEvent::ProductDeleted,
            other => WebhookEvent::Other(other.to_string()),
        }
    }
}

/// Ответ на вебхук
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
    pub event: String,
    /// `synced`, `archived`, `not_found` или `ignored`
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SingleProductSyncResult>,
}
