pub mod repository;

use repository::log_event_internal;

/// Логирование события на сервере (в таблицу system_log)
///
/// # Примеры
/// ```ignore
/// logger::log("startup", "Сервер запущен");
/// logger::log("u501_sync_from_winestro", "total=12, successful=12, failed=0");
/// ```
pub fn log(category: &str, message: &str) {
    log_event_internal("server", category, message);
}
