use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub winestro: WinestroConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Откуда брать артикулы
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Боевой API Winestro
    #[default]
    Live,
    /// Тестовый каталог из JSON-файла (или встроенный пример)
    Mock,
}

/// Как передавать учётные данные Winestro
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialPlacement {
    /// HTTP-заголовки X-Winestro-*
    #[default]
    Header,
    /// Параметры запроса (старый формат wbo-API.php)
    Query,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WinestroConfig {
    pub base_url: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub api_user: String,
    #[serde(default)]
    pub api_code: String,
    #[serde(default)]
    pub shop_id: String,
    #[serde(default)]
    pub credentials: CredentialPlacement,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub data_source: DataSource,
    /// JSON с тестовым каталогом для `data_source = "mock"`
    #[serde(default)]
    pub mock_data_path: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Максимум артикулов за прогон (None — без ограничения)
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Подтягивать остатки через getBestand при полной синхронизации
    #[serde(default)]
    pub reconcile_stock: bool,
    /// Cron-выражение встроенного планировщика (секунды первым полем)
    #[serde(default)]
    pub schedule: Option<String>,
    /// Сколько часов хранить завершённые сессии прогресса
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

fn default_batch_size() -> usize {
    10
}

fn default_session_ttl_hours() -> i64 {
    24
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            limit: None,
            batch_size: default_batch_size(),
            reconcile_stock: false,
            schedule: None,
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SecurityConfig {
    /// Секрет для проверки JWT админки
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Bearer-токен для внешнего cron
    #[serde(default)]
    pub cron_secret: Option<String>,
    /// Секрет HMAC-подписи вебхуков Winestro
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"

[server]
host = "0.0.0.0"
port = 3000

[winestro]
base_url = "https://weinstro.de/wbo-API.php"
credentials = "header"
timeout_secs = 60
data_source = "mock"

[sync]
batch_size = 10
reconcile_stock = false
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Current working directory (for development)
/// 3. Falls back to embedded default config
///
/// Secrets from the environment override the file values.
pub fn load_config() -> anyhow::Result<Config> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("config.toml"));
        }
    }
    candidates.push(PathBuf::from("config.toml"));

    let mut config = None;
    for config_path in &candidates {
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            let contents = std::fs::read_to_string(config_path)?;
            config = Some(parse_config(&contents)?);
            break;
        }
        tracing::warn!("config.toml not found at: {}", config_path.display());
    }

    let mut config = match config {
        Some(c) => c,
        None => {
            tracing::info!("Using default embedded configuration");
            parse_config(DEFAULT_CONFIG)?
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.sync.batch_size == 0 {
        anyhow::bail!("sync.batch_size must be greater than zero");
    }
    Ok(config)
}

/// Секреты из окружения имеют приоритет над config.toml
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("WINESTRO_UID") {
        config.winestro.uid = v;
    }
    if let Some(v) = get("WINESTRO_API_USER") {
        config.winestro.api_user = v;
    }
    if let Some(v) = get("WINESTRO_API_CODE") {
        config.winestro.api_code = v;
    }
    if let Some(v) = get("WINESTRO_SHOP_ID") {
        config.winestro.shop_id = v;
    }
    if let Some(v) = get("JWT_SECRET") {
        config.security.jwt_secret = Some(v);
    }
    if let Some(v) = get("SYNC_CRON_SECRET") {
        config.security.cron_secret = Some(v);
    }
    if let Some(v) = get("WINESTRO_WEBHOOK_SECRET") {
        config.security.webhook_secret = Some(v);
    }
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    let mut config = parse_config(DEFAULT_CONFIG).unwrap();
    config.security = SecurityConfig {
        jwt_secret: Some("test-jwt-secret".to_string()),
        cron_secret: Some("test-cron-secret".to_string()),
        webhook_secret: Some("test-webhook-secret".to_string()),
    };
    config
}
