//! Тестовые двойники источника Winestro и хранилища каталога

use super::winestro_api_client::{ErpSource, WinestroError};
use super::winestro_models::article_id_of;
use crate::domain::a001_product::{ProductRepository, ProductStore};
use async_trait::async_trait;
use contracts::domain::a001_product::Product;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Артикул из примера: `{id: "A100", title: "Riesling 2022", price: 12.5, stock: 30}`
pub(crate) fn riesling_a100() -> Value {
    json!({"id": "A100", "title": "Riesling 2022", "price": 12.5, "stock": 30})
}

/// Источник с заданными ответами и счётчиками вызовов
pub(crate) struct ScriptedSource {
    articles: Vec<Value>,
    stock: Vec<Value>,
    fail_status: Option<u16>,
    list_calls: AtomicUsize,
    article_calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new(articles: Vec<Value>) -> Self {
        Self {
            articles,
            stock: Vec::new(),
            fail_status: None,
            list_calls: AtomicUsize::new(0),
            article_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_stock(mut self, stock: Vec<Value>) -> Self {
        self.stock = stock;
        self
    }

    /// Каждый запрос отвечает HTTP-ошибкой
    pub(crate) fn failing(status: u16) -> Self {
        let mut source = Self::new(Vec::new());
        source.fail_status = Some(status);
        source
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn article_calls(&self) -> usize {
        self.article_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), WinestroError> {
        match self.fail_status {
            Some(status) => Err(WinestroError::Http {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ErpSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_articles(&self) -> Result<Vec<Value>, WinestroError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.articles.clone())
    }

    async fn fetch_article(&self, article_id: &str) -> Result<Option<Value>, WinestroError> {
        self.article_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .articles
            .iter()
            .find(|a| article_id_of(a).as_deref() == Some(article_id))
            .cloned())
    }

    async fn fetch_stock(&self) -> Result<Vec<Value>, WinestroError> {
        self.check()?;
        Ok(self.stock.clone())
    }
}

/// Хранилище, считающее обращения; может притвориться недоступным
pub(crate) struct RecordingStore {
    inner: ProductRepository,
    down: bool,
    calls: AtomicUsize,
}

impl RecordingStore {
    pub(crate) fn new(conn: DatabaseConnection) -> Self {
        Self {
            inner: ProductRepository::new(conn),
            down: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn down(mut self) -> Self {
        self.down = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for RecordingStore {
    async fn ping(&self) -> anyhow::Result<()> {
        self.touch()?;
        self.inner.ping().await
    }

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Product>> {
        self.touch()?;
        self.inner.find_by_external_id(external_id).await
    }

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool> {
        self.touch()?;
        self.inner.slug_exists(slug).await
    }

    async fn insert(&self, product: &Product) -> anyhow::Result<()> {
        self.touch()?;
        self.inner.insert(product).await
    }

    async fn update(&self, product: &Product) -> anyhow::Result<()> {
        self.touch()?;
        self.inner.update(product).await
    }
}
