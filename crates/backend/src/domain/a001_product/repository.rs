use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a001_product::{ImageRef, Product, ProductId, ProductStatus, WineVariant};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, Statement};

/// Хранилище документов каталога.
///
/// Поиск по `external_id` включает помеченные удалёнными документы:
/// повторно появившийся в ERP артикул восстанавливается, а не дублируется.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Дешёвая проверка доступности хранилища
    async fn ping(&self) -> anyhow::Result<()>;

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Product>>;

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool>;

    async fn insert(&self, product: &Product) -> anyhow::Result<()>;

    async fn update(&self, product: &Product) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub external_id: String,
    pub price: f64,
    pub stock: i64,
    pub status: String,
    pub sold_out_flag: bool,
    pub variant: String,
    pub vintage: Option<i32>,
    pub grape: Option<String>,
    pub volume_liters: Option<f64>,
    pub alcohol: Option<f64>,
    pub rating: f64,
    pub category_ref: Option<String>,
    pub long_description: Option<String>,
    /// JSON-массив `ImageRef`
    pub gallery: String,
    pub origin: String,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let id = ProductId::from_string(&m.id).unwrap_or_else(|e| {
            tracing::warn!("Product row {}: {}", m.id, e);
            ProductId::new_v4()
        });
        let gallery: Vec<ImageRef> = serde_json::from_str(&m.gallery).unwrap_or_else(|e| {
            tracing::warn!("Broken gallery JSON for product {}: {}", m.id, e);
            Vec::new()
        });

        Product {
            base: BaseAggregate::with_metadata(
                id,
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            external_id: m.external_id,
            price: m.price,
            stock: m.stock,
            status: ProductStatus::parse(&m.status).unwrap_or_default(),
            sold_out_flag: m.sold_out_flag,
            variant: WineVariant::parse(&m.variant).unwrap_or_default(),
            vintage: m.vintage,
            grape: m.grape,
            volume_liters: m.volume_liters,
            alcohol: m.alcohol,
            rating: m.rating,
            category_ref: m.category_ref,
            long_description: m.long_description,
            gallery,
            origin: Origin::parse(&m.origin),
            last_synced_at: m.last_synced_at,
        }
    }
}

fn to_active_model(aggregate: &Product) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.as_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        external_id: Set(aggregate.external_id.clone()),
        price: Set(aggregate.price),
        stock: Set(aggregate.stock),
        status: Set(aggregate.status.as_str().to_string()),
        sold_out_flag: Set(aggregate.sold_out_flag),
        variant: Set(aggregate.variant.as_str().to_string()),
        vintage: Set(aggregate.vintage),
        grape: Set(aggregate.grape.clone()),
        volume_liters: Set(aggregate.volume_liters),
        alcohol: Set(aggregate.alcohol),
        rating: Set(aggregate.rating),
        category_ref: Set(aggregate.category_ref.clone()),
        long_description: Set(aggregate.long_description.clone()),
        gallery: Set(serde_json::to_string(&aggregate.gallery)?),
        origin: Set(aggregate.origin.as_str().to_string()),
        last_synced_at: Set(aggregate.last_synced_at),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

/// Хранилище каталога на SQLite (sea-orm)
#[derive(Clone)]
pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Активные товары, по названию
    pub async fn list_all(&self) -> anyhow::Result<Vec<Product>> {
        let items: Vec<Product> = Entity::find()
            .filter(Column::IsDeleted.eq(false))
            .order_by_asc(Column::Description)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(items)
    }

    pub async fn get_by_id(&self, id: ProductId) -> anyhow::Result<Option<Product>> {
        let result = Entity::find_by_id(id.as_string()).one(&self.conn).await?;
        Ok(result.map(Into::into))
    }

    /// Число документов с данным external_id (включая удалённые)
    pub async fn count_by_external_id(&self, external_id: &str) -> anyhow::Result<u64> {
        let count = Entity::find()
            .filter(Column::ExternalId.eq(external_id))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn ping(&self) -> anyhow::Result<()> {
        self.conn
            .execute(Statement::from_string(
                self.conn.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Product>> {
        let result = Entity::find()
            .filter(Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool> {
        let count = Entity::find()
            .filter(Column::Code.eq(slug))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, product: &Product) -> anyhow::Result<()> {
        to_active_model(product)?.insert(&self.conn).await?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> anyhow::Result<()> {
        let mut active = to_active_model(product)?;
        active.created_at = sea_orm::ActiveValue::NotSet;
        active.update(&self.conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use contracts::domain::a001_product::SyncedFields;

    fn fields(title: &str) -> SyncedFields {
        SyncedFields {
            title: Some(title.to_string()),
            price: Some(9.9),
            stock: 4,
            status: ProductStatus::Active,
            variant: WineVariant::Red,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_external_id() {
        let repo = ProductRepository::new(connect_in_memory().await);
        repo.ping().await.unwrap();

        let mut product =
            Product::new_from_sync("B7", "spaetburgunder".to_string(), &fields("Spätburgunder"))
                .unwrap();
        product.gallery.push(ImageRef {
            url: "https://cdn.example/b7.jpg".to_string(),
            alt: Some("Flasche".to_string()),
        });
        repo.insert(&product).await.unwrap();

        let loaded = repo.find_by_external_id("B7").await.unwrap().unwrap();
        assert_eq!(loaded.base.id, product.base.id);
        assert_eq!(loaded.title(), "Spätburgunder");
        assert_eq!(loaded.status, ProductStatus::Active);
        assert_eq!(loaded.variant, WineVariant::Red);
        assert_eq!(loaded.gallery, product.gallery);
        assert!(repo.slug_exists("spaetburgunder").await.unwrap());
        assert!(!repo.slug_exists("dornfelder").await.unwrap());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_external_id_is_rejected() {
        let repo = ProductRepository::new(connect_in_memory().await);
        let first = Product::new_from_sync("B7", "a".to_string(), &fields("A")).unwrap();
        let second = Product::new_from_sync("B7", "b".to_string(), &fields("B")).unwrap();
        repo.insert(&first).await.unwrap();
        assert!(repo.insert(&second).await.is_err());
        assert_eq!(repo.count_by_external_id("B7").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleted_products_are_hidden_from_list_but_found_by_external_id() {
        let repo = ProductRepository::new(connect_in_memory().await);
        let mut product = Product::new_from_sync("B7", "a".to_string(), &fields("A")).unwrap();
        repo.insert(&product).await.unwrap();

        product.archive();
        repo.update(&product).await.unwrap();

        assert!(repo.list_all().await.unwrap().is_empty());
        let loaded = repo.find_by_external_id("B7").await.unwrap().unwrap();
        assert!(loaded.base.metadata.is_deleted);
        assert_eq!(loaded.status, ProductStatus::Archived);
    }
}
