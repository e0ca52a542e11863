use chrono::{DateTime, Utc};
use contracts::usecases::u501_sync_from_winestro::{SyncOptions, SyncResult, SyncTrigger};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::logger::TaskLogger;
use crate::usecases::u501_sync_from_winestro::{SyncError, SyncExecutor};

/// Разобрать cron-выражение `[sync].schedule` (секунды первым полем)
pub fn parse_schedule(expr: &str) -> anyhow::Result<Schedule> {
    Schedule::from_str(expr.trim())
        .map_err(|e| anyhow::anyhow!("invalid sync schedule '{}': {}", expr, e))
}

/// Фоновый воркер полной синхронизации по расписанию
pub struct ScheduledSyncWorker {
    executor: Arc<SyncExecutor>,
    logger: Arc<TaskLogger>,
    schedule: Schedule,
}

impl ScheduledSyncWorker {
    pub fn new(executor: Arc<SyncExecutor>, logger: Arc<TaskLogger>, schedule: Schedule) -> Self {
        Self {
            executor,
            logger,
            schedule,
        }
    }

    pub fn next_run_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&now).next()
    }

    /// Цикл: ждать ближайшего срабатывания и запускать синхронизацию
    pub async fn run_loop(&self) {
        info!("Scheduled sync worker started");
        loop {
            let now = Utc::now();
            let Some(next_run) = self.next_run_after(now) else {
                warn!("Sync schedule has no upcoming runs, worker stopped");
                return;
            };
            info!("Next scheduled sync at {}", next_run);

            let wait = (next_run - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let session_id = Uuid::new_v4().to_string();
            if let Err(e) = self.run_once(&session_id).await {
                error!("Scheduled sync {} failed: {}", session_id, e);
            }
        }
    }

    /// Один запуск. Лог сессии называется по id сессии прогресса,
    /// так что его можно сопоставить с `/api/admin/sync/:id/progress`
    pub async fn run_once(&self, session_id: &str) -> Result<SyncResult, SyncError> {
        self.write_log(session_id, "Scheduled catalog sync started");

        let outcome = self
            .executor
            .sync_products_in_session(
                session_id.to_string(),
                &SyncOptions::default(),
                SyncTrigger::Schedule,
            )
            .await;

        match &outcome {
            Ok(result) => {
                self.write_log(session_id, &format!("Finished: {}", result.summary()));
                for message in &result.errors {
                    self.write_log(session_id, &format!("  error: {}", message));
                }
            }
            Err(e) => self.write_log(session_id, &format!("Aborted: {}", e)),
        }
        outcome
    }

    /// Ошибка записи лога не должна мешать синхронизации
    fn write_log(&self, session_id: &str, message: &str) {
        if let Err(e) = self.logger.write_log(session_id, message) {
            warn!("Task log for session {} not written: {}", session_id, e);
        }
    }
}
