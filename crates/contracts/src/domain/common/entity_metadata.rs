use serde::{Deserialize, Serialize};

/// Метаданные экземпляра агрегата (lifecycle tracking)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Мягкое удаление (soft delete)
    pub is_deleted: bool,
    /// Опубликован в витрине
    pub is_posted: bool,
    /// Номер ревизии, растёт с каждой записью
    pub version: i32,
}

impl EntityMetadata {
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            is_deleted: false,
            is_posted: false,
            version: 0,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }

    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    /// Пометить запись удалённой
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    /// Снять пометку удаления
    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.touch();
    }
}

impl Default for EntityMetadata {
    fn default() -> Self {
        Self::new()
    }
}
