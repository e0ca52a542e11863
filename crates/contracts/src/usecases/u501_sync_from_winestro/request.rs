use serde::{Deserialize, Serialize};

/// Действие, запрошенное из админки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    /// Полная синхронизация каталога
    SyncProducts,
    /// Синхронизация одного артикула (`options.article_id`)
    SyncSingleProduct,
    /// Проверка доступа к Winestro без записи в каталог
    TestConnection,
    /// Обновление только остатков
    SyncStock,
}

/// Параметры запуска. Незаданные поля берутся из `[sync]` в config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Максимальное число артикулов за прогон
    pub limit: Option<usize>,
    /// Размер пачки
    #[serde(alias = "batchSize")]
    pub batch_size: Option<usize>,
    /// Артикул для `sync-single-product`
    #[serde(alias = "articleId", alias = "productId")]
    pub article_id: Option<String>,
    /// Подтягивать остатки отдельным запросом getBestand
    #[serde(alias = "reconcileStock")]
    pub reconcile_stock: Option<bool>,
}

/// Тело `POST /api/admin/sync`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    pub action: SyncAction,
    #[serde(default)]
    pub options: SyncOptions,
}

/// Кто запустил синхронизацию
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Admin,
    Cron,
    Webhook,
    Schedule,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Admin => "admin",
            SyncTrigger::Cron => "cron",
            SyncTrigger::Webhook => "webhook",
            SyncTrigger::Schedule => "schedule",
        }
    }
}
