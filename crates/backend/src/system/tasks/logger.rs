use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Логгер запусков по расписанию: один файл на сессию синхронизации
pub struct TaskLogger {
    log_dir: PathBuf,
}

impl TaskLogger {
    pub fn new(base_log_dir: &Path) -> Self {
        Self {
            log_dir: base_log_dir.join("task_logs"),
        }
    }

    pub fn get_log_file_path(&self, session_id: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", session_id))
    }

    /// Дописать строку в лог сессии (файл создаётся при первой записи)
    pub fn write_log(&self, session_id: &str, message: &str) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.get_log_file_path(session_id))?;

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    pub fn read_log(&self, session_id: &str) -> Result<Option<String>> {
        let path = self.get_log_file_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_session_log() {
        let dir = std::env::temp_dir().join(format!("task-logger-{}", uuid::Uuid::new_v4()));
        let logger = TaskLogger::new(&dir);

        assert!(logger.read_log("s1").unwrap().is_none());
        logger.write_log("s1", "Scheduled sync started").unwrap();
        logger.write_log("s1", "total=3, successful=3, failed=0").unwrap();

        let content = logger.read_log("s1").unwrap().unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("Scheduled sync started"));

        let _ = fs::remove_dir_all(dir);
    }
}
