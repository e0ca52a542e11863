use contracts::usecases::u501_sync_from_winestro::{SyncPhase, SyncProgress, SyncTrigger};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Трекер прогресса синхронизации (in-memory)
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, SyncProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn with_session<F>(&self, session_id: &str, f: F)
    where
        F: FnOnce(&mut SyncProgress),
    {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = sessions.get_mut(session_id) {
            f(p);
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn create_session(&self, session_id: String, trigger: SyncTrigger) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session_id.clone(), SyncProgress::new(session_id, trigger));
    }

    pub fn get_progress(&self, session_id: &str) -> Option<SyncProgress> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// Последняя начатая сессия
    pub fn latest(&self) -> Option<SyncProgress> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .max_by_key(|p| p.started_at)
            .cloned()
    }

    pub fn set_phase(&self, session_id: &str, phase: SyncPhase) {
        self.with_session(session_id, |p| p.phase = phase);
    }

    pub fn set_total(&self, session_id: &str, total: usize) {
        self.with_session(session_id, |p| p.total = Some(total));
    }

    pub fn record_item(&self, session_id: &str, current_item: Option<String>, ok: bool) {
        self.with_session(session_id, |p| {
            p.processed += 1;
            if ok {
                p.successful += 1;
            } else {
                p.failed += 1;
            }
            p.current_item = current_item;
        });
    }

    pub fn add_error(&self, session_id: &str, message: String) {
        self.with_session(session_id, |p| p.error_messages.push(message));
    }

    pub fn complete_session(&self, session_id: &str, phase: SyncPhase) {
        self.with_session(session_id, |p| {
            p.phase = phase;
            p.current_item = None;
            p.completed_at = Some(chrono::Utc::now());
        });
    }

    pub fn cleanup_old_sessions(&self, max_age_hours: i64) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = chrono::Utc::now();
        sessions.retain(|_, p| match p.completed_at {
            Some(completed_at) => (now - completed_at).num_hours() < max_age_hours,
            None => true,
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
