use super::request::SyncTrigger;
use crate::domain::a001_product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Что произошло с документом каталога
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Created,
    Updated,
    /// Данные совпали, запись пропущена
    Unchanged,
}

/// Итог одного прогона синхронизации.
///
/// Всегда `total == successful + failed` и `errors.len() == failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub session_id: String,
    pub trigger: SyncTrigger,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Остатки по артикулам, которых нет в каталоге (только sync-stock)
    pub skipped: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncResult {
    pub fn new(session_id: String, trigger: SyncTrigger) -> Self {
        Self {
            success: true,
            session_id,
            trigger,
            total: 0,
            successful: 0,
            failed: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_success(&mut self, outcome: ItemOutcome) {
        self.total += 1;
        self.successful += 1;
        match outcome {
            ItemOutcome::Created => self.created += 1,
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn record_failure(&mut self, message: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push(message);
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn finish(&mut self) {
        self.success = self.failed == 0;
        self.finished_at = Some(Utc::now());
    }

    /// Короткая строка для логов и уведомлений
    pub fn summary(&self) -> String {
        format!(
            "total={}, successful={}, failed={} (created={}, updated={}, unchanged={}, skipped={})",
            self.total,
            self.successful,
            self.failed,
            self.created,
            self.updated,
            self.unchanged,
            self.skipped
        )
    }
}

/// Итог синхронизации одного артикула
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleProductSyncResult {
    pub success: bool,
    pub external_id: String,
    pub action: Option<ItemOutcome>,
    pub product: Option<Product>,
    pub error: Option<String>,
}

impl SingleProductSyncResult {
    pub fn synced(external_id: String, action: ItemOutcome, product: Product) -> Self {
        Self {
            success: true,
            external_id,
            action: Some(action),
            product: Some(product),
            error: None,
        }
    }

    pub fn failed(external_id: String, error: String) -> Self {
        Self {
            success: false,
            external_id,
            action: None,
            product: None,
            error: Some(error),
        }
    }
}

/// Результат проверки подключения к Winestro
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub article_count: Option<usize>,
    pub latency_ms: u64,
}

/// Ответ `POST /api/admin/sync`, форма зависит от действия
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncResponse {
    Catalog(SyncResult),
    Single(SingleProductSyncResult),
    Connection(ConnectionTestResult),
}
