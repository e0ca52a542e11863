use super::request::SyncTrigger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Текущий прогресс синхронизации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub session_id: String,
    pub trigger: SyncTrigger,
    pub phase: SyncPhase,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    pub processed: usize,
    pub total: Option<usize>,
    pub successful: usize,
    pub failed: usize,

    /// Текущий обрабатываемый артикул
    pub current_item: Option<String>,

    pub error_messages: Vec<String>,
}

/// Фаза прогона: `Idle → Fetching → Upserting → Completed*`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    /// Загрузка артикулов из Winestro
    Fetching,
    /// Маппинг и запись товаров
    Upserting,
    Completed,
    CompletedWithErrors,
    /// Прогон прерван (Winestro или каталог недоступны)
    Failed,
}

impl SyncPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncPhase::Completed | SyncPhase::CompletedWithErrors | SyncPhase::Failed
        )
    }
}

impl SyncProgress {
    pub fn new(session_id: String, trigger: SyncTrigger) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            trigger,
            phase: SyncPhase::Idle,
            started_at: now,
            completed_at: None,
            updated_at: now,
            processed: 0,
            total: None,
            successful: 0,
            failed: 0,
            current_item: None,
            error_messages: Vec::new(),
        }
    }
}
