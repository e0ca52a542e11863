use super::mapper::map_article;
use super::progress_tracker::ProgressTracker;
use super::winestro_api_client::{ErpSource, WinestroError};
use super::winestro_models::{article_id_of, ExternalArticle, StockRecord};
use crate::domain::a001_product::service::{self, UpsertOutcome};
use crate::domain::a001_product::ProductStore;
use crate::shared::config::SyncConfig;
use crate::shared::logger;
use contracts::domain::a001_product::Product;
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u501_sync_from_winestro::{
    ConnectionTestResult, SingleProductSyncResult, SyncAction, SyncFromWinestro, SyncOptions,
    SyncPhase, SyncProgress, SyncRequest, SyncResponse, SyncResult, SyncTrigger,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Ошибки, прерывающие прогон целиком.
/// Ошибки отдельных артикулов попадают в `SyncResult.errors`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Erp(#[from] WinestroError),

    #[error("content store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("content store error: {0}")]
    Store(String),
}

/// Параметры прогона по умолчанию (секция `[sync]`)
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub limit: Option<usize>,
    pub batch_size: usize,
    pub reconcile_stock: bool,
    pub session_ttl_hours: i64,
}

impl From<&SyncConfig> for SyncSettings {
    fn from(cfg: &SyncConfig) -> Self {
        Self {
            limit: cfg.limit,
            batch_size: cfg.batch_size.max(1),
            reconcile_stock: cfg.reconcile_stock,
            session_ttl_hours: cfg.session_ttl_hours,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

/// Executor для UseCase синхронизации каталога из Winestro
pub struct SyncExecutor {
    erp: Arc<dyn ErpSource>,
    store: Arc<dyn ProductStore>,
    settings: SyncSettings,
    pub progress_tracker: Arc<ProgressTracker>,
}

impl SyncExecutor {
    pub fn new(erp: Arc<dyn ErpSource>, store: Arc<dyn ProductStore>, settings: SyncSettings) -> Self {
        Self {
            erp,
            store,
            settings,
            progress_tracker: Arc::new(ProgressTracker::new()),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.erp.name()
    }

    /// Выполнить действие из админки / cron
    pub async fn execute(
        &self,
        request: &SyncRequest,
        trigger: SyncTrigger,
    ) -> Result<SyncResponse, SyncError> {
        match request.action {
            SyncAction::SyncProducts => Ok(SyncResponse::Catalog(
                self.sync_products(&request.options, trigger).await?,
            )),
            SyncAction::SyncSingleProduct => {
                let article_id = request
                    .options
                    .article_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        SyncError::InvalidRequest(
                            "options.article_id is required for sync-single-product".to_string(),
                        )
                    })?;
                Ok(SyncResponse::Single(
                    self.sync_single_product(article_id, trigger).await?,
                ))
            }
            SyncAction::TestConnection => Ok(SyncResponse::Connection(self.test_connection().await)),
            SyncAction::SyncStock => Ok(SyncResponse::Catalog(self.sync_stock(trigger).await?)),
        }
    }

    /// Полная синхронизация каталога
    pub async fn sync_products(
        &self,
        options: &SyncOptions,
        trigger: SyncTrigger,
    ) -> Result<SyncResult, SyncError> {
        self.sync_products_in_session(Uuid::new_v4().to_string(), options, trigger)
            .await
    }

    /// Полная синхронизация под заданным id сессии прогресса
    pub async fn sync_products_in_session(
        &self,
        session_id: String,
        options: &SyncOptions,
        trigger: SyncTrigger,
    ) -> Result<SyncResult, SyncError> {
        self.start_session(&session_id, trigger);
        let outcome = self.run_catalog_sync(&session_id, options, trigger).await;
        self.finish_session(&session_id, "sync-products", trigger, outcome)
    }

    /// Обновить только остатки существующих товаров
    pub async fn sync_stock(&self, trigger: SyncTrigger) -> Result<SyncResult, SyncError> {
        let session_id = Uuid::new_v4().to_string();
        self.start_session(&session_id, trigger);
        let outcome = self.run_stock_sync(&session_id, trigger).await;
        self.finish_session(&session_id, "sync-stock", trigger, outcome)
    }

    /// Синхронизировать один артикул
    pub async fn sync_single_product(
        &self,
        article_id: &str,
        trigger: SyncTrigger,
    ) -> Result<SingleProductSyncResult, SyncError> {
        let article_id = article_id.trim();
        self.ensure_store().await?;

        let Some(raw) = self.erp.fetch_article(article_id).await? else {
            tracing::warn!("Article {} not found in {}", article_id, self.erp.name());
            return Ok(SingleProductSyncResult::failed(
                article_id.to_string(),
                format!("Article {} not found in Winestro", article_id),
            ));
        };

        if let Some(returned) = article_id_of(&raw).filter(|id| id != article_id) {
            tracing::warn!(
                "{} returned article {} for {}, ignored",
                self.erp.name(),
                returned,
                article_id
            );
            return Ok(SingleProductSyncResult::failed(
                article_id.to_string(),
                format!("Winestro returned article {} instead of {}", returned, article_id),
            ));
        }

        let result = match self.sync_item(&raw, Some(article_id), &HashMap::new()).await {
            Ok(outcome) => {
                tracing::info!(
                    "Article {} synced ({:?}) via {}",
                    article_id,
                    outcome.action,
                    trigger.as_str()
                );
                SingleProductSyncResult::synced(
                    outcome.product.external_id.clone(),
                    outcome.action,
                    outcome.product,
                )
            }
            Err(message) => {
                tracing::warn!("{}", message);
                SingleProductSyncResult::failed(article_id.to_string(), message)
            }
        };

        logger::log(
            &SyncFromWinestro::full_name(),
            &format!(
                "[{}] sync-single-product {}: {}",
                trigger.as_str(),
                article_id,
                match (&result.action, &result.error) {
                    (Some(action), _) => format!("{:?}", action).to_lowercase(),
                    (None, Some(error)) => format!("failed ({})", error),
                    (None, None) => "failed".to_string(),
                }
            ),
        );
        Ok(result)
    }

    /// Проверка доступа к Winestro. Каталог не трогает
    pub async fn test_connection(&self) -> ConnectionTestResult {
        let started = Instant::now();
        let probe = self.erp.probe().await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match probe {
            Ok(count) => {
                tracing::info!("Winestro connection OK: {} articles ({} ms)", count, latency_ms);
                ConnectionTestResult {
                    success: true,
                    message: format!("Connected to {} ({} articles)", self.erp.name(), count),
                    article_count: Some(count),
                    latency_ms,
                }
            }
            Err(e) => {
                tracing::warn!("Winestro connection test failed: {}", e);
                ConnectionTestResult {
                    success: false,
                    message: e.to_string(),
                    article_count: None,
                    latency_ms,
                }
            }
        }
    }

    /// Снять товар с продажи (событие product.deleted).
    /// `None` — такого артикула в каталоге нет
    pub async fn archive_product(&self, article_id: &str) -> Result<Option<Product>, SyncError> {
        let archived = service::mark_deleted(self.store.as_ref(), article_id)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;

        match &archived {
            Some(product) => {
                tracing::info!("Article {} archived ({})", article_id, product.slug());
                logger::log(
                    &SyncFromWinestro::full_name(),
                    &format!("[webhook] product.deleted {}: archived", article_id),
                );
            }
            None => tracing::info!("Article {} is not in the catalog, nothing to archive", article_id),
        }
        Ok(archived)
    }

    pub fn get_progress(&self, session_id: &str) -> Option<SyncProgress> {
        self.progress_tracker.get_progress(session_id)
    }

    pub fn latest_progress(&self) -> Option<SyncProgress> {
        self.progress_tracker.latest()
    }

    fn start_session(&self, session_id: &str, trigger: SyncTrigger) {
        self.progress_tracker
            .cleanup_old_sessions(self.settings.session_ttl_hours);
        self.progress_tracker
            .create_session(session_id.to_string(), trigger);
    }

    fn finish_session(
        &self,
        session_id: &str,
        action: &str,
        trigger: SyncTrigger,
        outcome: Result<SyncResult, SyncError>,
    ) -> Result<SyncResult, SyncError> {
        let category = SyncFromWinestro::full_name();
        match outcome {
            Ok(result) => {
                let phase = if result.failed > 0 {
                    SyncPhase::CompletedWithErrors
                } else {
                    SyncPhase::Completed
                };
                self.progress_tracker.complete_session(session_id, phase);
                tracing::info!(
                    "{} finished [{}]: {}",
                    action,
                    trigger.as_str(),
                    result.summary()
                );
                logger::log(
                    &category,
                    &format!("[{}] {}: {}", trigger.as_str(), action, result.summary()),
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!("{} aborted [{}]: {}", action, trigger.as_str(), e);
                self.progress_tracker
                    .add_error(session_id, format!("Sync aborted: {}", e));
                self.progress_tracker
                    .complete_session(session_id, SyncPhase::Failed);
                logger::log(
                    &category,
                    &format!("[{}] {} aborted: {}", trigger.as_str(), action, e),
                );
                Err(e)
            }
        }
    }

    async fn ensure_store(&self) -> Result<(), SyncError> {
        self.store
            .ping()
            .await
            .map_err(|e| SyncError::StoreUnavailable(e.to_string()))
    }

    async fn run_catalog_sync(
        &self,
        session_id: &str,
        options: &SyncOptions,
        trigger: SyncTrigger,
    ) -> Result<SyncResult, SyncError> {
        let limit = options.limit.or(self.settings.limit);
        let batch_size = options
            .batch_size
            .filter(|b| *b > 0)
            .unwrap_or(self.settings.batch_size)
            .max(1);
        let reconcile_stock = options
            .reconcile_stock
            .unwrap_or(self.settings.reconcile_stock);

        self.ensure_store().await?;

        self.progress_tracker
            .set_phase(session_id, SyncPhase::Fetching);
        let mut articles = self.erp.fetch_articles().await?;
        tracing::info!("Got {} articles from {}", articles.len(), self.erp.name());

        let stock_overrides = if reconcile_stock {
            match self.erp.fetch_stock().await {
                Ok(records) => stock_map(&records),
                Err(e) => {
                    tracing::warn!("Stock reconciliation skipped: {}", e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        if let Some(limit) = limit {
            articles.truncate(limit);
        }

        self.progress_tracker.set_total(session_id, articles.len());
        self.progress_tracker
            .set_phase(session_id, SyncPhase::Upserting);

        let mut result = SyncResult::new(session_id.to_string(), trigger);
        for (batch_no, batch) in articles.chunks(batch_size).enumerate() {
            tracing::debug!("Batch {}: {} articles", batch_no + 1, batch.len());

            for raw in batch {
                let label = article_id_of(raw);
                match self.sync_item(raw, None, &stock_overrides).await {
                    Ok(outcome) => {
                        result.record_success(outcome.action);
                        self.progress_tracker.record_item(session_id, label, true);
                    }
                    Err(message) => {
                        tracing::warn!("{}", message);
                        self.progress_tracker.add_error(session_id, message.clone());
                        self.progress_tracker.record_item(session_id, label, false);
                        result.record_failure(message);
                    }
                }
            }
        }

        result.finish();
        Ok(result)
    }

    async fn run_stock_sync(
        &self,
        session_id: &str,
        trigger: SyncTrigger,
    ) -> Result<SyncResult, SyncError> {
        self.ensure_store().await?;

        self.progress_tracker
            .set_phase(session_id, SyncPhase::Fetching);
        let records = self.erp.fetch_stock().await?;
        tracing::info!("Got {} stock records from {}", records.len(), self.erp.name());

        self.progress_tracker.set_total(session_id, records.len());
        self.progress_tracker
            .set_phase(session_id, SyncPhase::Upserting);

        let mut result = SyncResult::new(session_id.to_string(), trigger);
        for raw in &records {
            let Some(record) = StockRecord::from_value(raw) else {
                let message = format!(
                    "Stock record {}: missing article number or quantity",
                    article_id_of(raw).unwrap_or_else(|| raw.to_string())
                );
                self.progress_tracker.add_error(session_id, message.clone());
                self.progress_tracker.record_item(session_id, None, false);
                result.record_failure(message);
                continue;
            };

            match service::update_stock(self.store.as_ref(), &record.article_id, record.stock.max(0))
                .await
            {
                Ok(Some(outcome)) => {
                    result.record_success(outcome.action);
                    self.progress_tracker
                        .record_item(session_id, Some(record.article_id), true);
                }
                Ok(None) => {
                    tracing::debug!("Stock for unknown article {} skipped", record.article_id);
                    result.record_skipped();
                }
                Err(e) => {
                    let message = format!("Article {}: {}", record.article_id, e);
                    self.progress_tracker.add_error(session_id, message.clone());
                    self.progress_tracker
                        .record_item(session_id, Some(record.article_id), false);
                    result.record_failure(message);
                }
            }
        }

        result.finish();
        Ok(result)
    }

    /// Разобрать, смапить и записать один артикул.
    /// Ошибка — готовое сообщение для `SyncResult.errors`
    async fn sync_item(
        &self,
        raw: &Value,
        fallback_id: Option<&str>,
        stock_overrides: &HashMap<String, i64>,
    ) -> Result<UpsertOutcome, String> {
        let label = article_id_of(raw)
            .or_else(|| fallback_id.map(str::to_string))
            .unwrap_or_else(|| "<unknown>".to_string());

        let mut article =
            ExternalArticle::from_value(raw).map_err(|e| format!("Article {}: {}", label, e))?;
        if article.id.is_none() {
            article.id = fallback_id.map(str::to_string);
        }
        let Some(external_id) = article.id.clone() else {
            return Err(format!(
                "Article {}: missing required field 'externalId'",
                label
            ));
        };
        if let Some(stock) = stock_overrides.get(&external_id) {
            article.stock = Some(*stock);
        }

        let fields = map_article(&article);
        service::upsert_from_erp(self.store.as_ref(), &external_id, &fields)
            .await
            .map_err(|e| format!("Article {}: {}", external_id, e))
    }
}

fn stock_map(records: &[Value]) -> HashMap<String, i64> {
    records
        .iter()
        .filter_map(StockRecord::from_value)
        .map(|r| (r.article_id, r.stock))
        .collect()
}
