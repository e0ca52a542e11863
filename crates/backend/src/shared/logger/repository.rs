use chrono::Utc;
use contracts::shared::logger::LogEntry;
use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use crate::shared::data::db::try_get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "system_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: String,
    pub source: String,
    pub category: String,
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LogEntry {
    fn from(m: Model) -> Self {
        LogEntry {
            id: m.id,
            timestamp: m.timestamp,
            source: m.source,
            category: m.category,
            message: m.message,
        }
    }
}

/// Добавить запись в лог в фоне (внутренняя функция).
/// Пока БД не инициализирована, запись только уходит в tracing.
pub fn log_event_internal(source: &str, category: &str, message: &str) {
    let Some(conn) = try_get_connection() else {
        tracing::debug!("system_log unavailable, dropping [{}] {}", category, message);
        return;
    };
    let source = source.to_string();
    let category = category.to_string();
    let message = message.to_string();

    tokio::spawn(async move {
        if let Err(e) = log_event(conn, &source, &category, &message).await {
            tracing::error!("Failed to log event: {}", e);
        }
    });
}

/// Добавить запись в лог
pub async fn log_event(
    conn: &DatabaseConnection,
    source: &str,
    category: &str,
    message: &str,
) -> anyhow::Result<()> {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();

    let active = ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        timestamp: Set(now),
        source: Set(source.to_string()),
        category: Set(category.to_string()),
        message: Set(message.to_string()),
    };

    active.insert(conn).await?;
    Ok(())
}

/// Последние записи лога (новые сверху), опционально по категории
pub async fn list_recent(
    conn: &DatabaseConnection,
    category: Option<&str>,
    limit: u64,
) -> anyhow::Result<Vec<LogEntry>> {
    let mut query = Entity::find();
    if let Some(category) = category {
        query = query.filter(Column::Category.eq(category));
    }
    let logs: Vec<LogEntry> = query
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_log_roundtrip_filters_by_category() {
        let conn = connect_in_memory().await;
        log_event(&conn, "server", "u501_sync_from_winestro", "total=2")
            .await
            .unwrap();
        log_event(&conn, "server", "startup", "Server started")
            .await
            .unwrap();

        let all = list_recent(&conn, None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].category, "startup");

        let sync = list_recent(&conn, Some("u501_sync_from_winestro"), 10)
            .await
            .unwrap();
        assert_eq!(sync.len(), 1);
        assert_eq!(sync[0].message, "total=2");
    }
}
