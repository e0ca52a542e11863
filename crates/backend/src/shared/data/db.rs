use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Схема каталога. `external_id` и `code` (slug) уникальны:
/// один артикул Winestro — один документ.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_product (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL,
        description TEXT NOT NULL,
        comment TEXT,
        external_id TEXT NOT NULL,
        price REAL NOT NULL DEFAULT 0,
        stock INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'draft',
        sold_out_flag INTEGER NOT NULL DEFAULT 0,
        variant TEXT NOT NULL DEFAULT 'other',
        vintage INTEGER,
        grape TEXT,
        volume_liters REAL,
        alcohol REAL,
        rating REAL NOT NULL DEFAULT 0,
        category_ref TEXT,
        long_description TEXT,
        gallery TEXT NOT NULL DEFAULT '[]',
        origin TEXT NOT NULL DEFAULT 'winestro',
        last_synced_at TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_a001_product_external_id ON a001_product (external_id);",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_a001_product_code ON a001_product (code);",
    r#"
    CREATE TABLE IF NOT EXISTS system_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        source TEXT NOT NULL,
        category TEXT NOT NULL,
        message TEXT NOT NULL
    );
    "#,
];

/// Открыть файл БД, создать схему и запомнить подключение для процесса
pub async fn initialize_database(db_file: &str) -> anyhow::Result<&'static DatabaseConnection> {
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    let conn = connect(&db_url).await?;
    tracing::info!("Database opened: {}", absolute_path.display());

    let _ = DB_CONN.set(conn);
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("database connection was not stored"))
}

/// Подключиться по URL и применить схему
pub async fn connect(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(db_url.to_string());
    options.sqlx_logging(false);
    if db_url.contains(":memory:") {
        // у каждого подключения к :memory: своя база
        options.max_connections(1).min_connections(1);
    }
    let conn = Database::connect(options).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for sql in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            sql.to_string(),
        ))
        .await?;
    }
    Ok(())
}

/// Подключение процесса, если БД уже инициализирована
pub fn try_get_connection() -> Option<&'static DatabaseConnection> {
    DB_CONN.get()
}

#[cfg(test)]
pub(crate) async fn connect_in_memory() -> DatabaseConnection {
    connect("sqlite::memory:").await.unwrap()
}
