pub mod api;
pub mod domain;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, Method};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::api::AppState;
use crate::domain::a001_product::ProductRepository;
use crate::shared::config::{self, Config, DataSource};
use crate::system::tasks::{logger::TaskLogger, worker};
use crate::usecases::u501_sync_from_winestro::{
    ErpSource, FixtureSource, SyncExecutor, SyncSettings, WinestroApiClient,
};

/// Источник артикулов по `winestro.data_source`
fn build_erp_source(config: &Config) -> anyhow::Result<Arc<dyn ErpSource>> {
    let source: Arc<dyn ErpSource> = match config.winestro.data_source {
        DataSource::Live => {
            tracing::info!("Winestro data source: live ({})", config.winestro.base_url);
            Arc::new(WinestroApiClient::new(config.winestro.clone())?)
        }
        DataSource::Mock => {
            tracing::warn!("Winestro data source: MOCK, no live ERP calls will be made");
            Arc::new(FixtureSource::from_config(&config.winestro)?)
        }
    };
    Ok(source)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = config::load_config()?;

    let db_path = config::get_database_path(&config)?;
    let db = shared::data::db::initialize_database(&db_path.to_string_lossy())
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    let products = ProductRepository::new(db.clone());
    let executor = Arc::new(SyncExecutor::new(
        build_erp_source(&config)?,
        Arc::new(products.clone()),
        SyncSettings::from(&config.sync),
    ));

    if config.security.jwt_secret.is_none() {
        tracing::warn!("security.jwt_secret is not set: admin routes will reject every request");
    }
    if config.security.cron_secret.is_none() {
        tracing::warn!("security.cron_secret is not set: /api/cron/sync is disabled");
    }

    if let Some(expr) = config.sync.schedule.as_deref().filter(|s| !s.trim().is_empty()) {
        let schedule = worker::parse_schedule(expr)?;
        let task_logger = Arc::new(TaskLogger::new(&system::tracing::log_dir()));
        let sync_worker = worker::ScheduledSyncWorker::new(executor.clone(), task_logger, schedule);
        tracing::info!("Scheduled sync enabled: '{}'", expr);
        tokio::spawn(async move {
            sync_worker.run_loop().await;
        });
    }

    let state = AppState {
        executor,
        products,
        db: db.clone(),
        security: Arc::new(config.security.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static("x-winestro-signature"),
        ]);

    let app = routes::configure_routes(state)
        .layer(axum::middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    shared::logger::log("startup", &format!("Server started on {}", addr));
    tracing::info!("Server running on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
