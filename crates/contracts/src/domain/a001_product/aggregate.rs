use crate::domain::common::{AggregateId, BaseAggregate, Origin};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Рейтинг, который получает новый товар, пока его не поправили вручную
pub const DEFAULT_RATING: f64 = 5.0;

// ============================================================================
// ID Type
// ============================================================================

/// Уникальный идентификатор товара в каталоге
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for ProductId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ProductId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Статус товара в витрине
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Продаётся
    Active,
    /// Скрыт (в ERP выключен для магазина)
    #[default]
    Draft,
    /// Нет в наличии
    SoldOut,
    /// Снят с продажи / удалён в ERP
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Draft => "draft",
            ProductStatus::SoldOut => "sold_out",
            ProductStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProductStatus::Active),
            "draft" => Some(ProductStatus::Draft),
            "sold_out" => Some(ProductStatus::SoldOut),
            "archived" => Some(ProductStatus::Archived),
            _ => None,
        }
    }
}

/// Вариант (тип) вина
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WineVariant {
    Red,
    White,
    Rose,
    Sparkling,
    Dessert,
    #[default]
    Other,
}

impl WineVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            WineVariant::Red => "red",
            WineVariant::White => "white",
            WineVariant::Rose => "rose",
            WineVariant::Sparkling => "sparkling",
            WineVariant::Dessert => "dessert",
            WineVariant::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "red" => Some(WineVariant::Red),
            "white" => Some(WineVariant::White),
            "rose" => Some(WineVariant::Rose),
            "sparkling" => Some(WineVariant::Sparkling),
            "dessert" => Some(WineVariant::Dessert),
            "other" => Some(WineVariant::Other),
            _ => None,
        }
    }
}

/// Ссылка на изображение товара
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

// ============================================================================
// Synced fields
// ============================================================================

/// Поля товара, которыми владеет ERP.
///
/// `rating`, `category` и `image_url` применяются только при создании
/// документа: после этого ими управляют вручную в админке.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedFields {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub stock: i64,
    pub status: ProductStatus,
    /// Флаг «ausverkauft» в ERP, независимо от остатка
    #[serde(default)]
    pub sold_out_flag: bool,
    pub variant: WineVariant,
    pub vintage: Option<i32>,
    pub grape: Option<String>,
    pub volume_liters: Option<f64>,
    pub alcohol: Option<f64>,
    pub rating: f64,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl Default for SyncedFields {
    fn default() -> Self {
        Self {
            title: None,
            price: None,
            stock: 0,
            status: ProductStatus::default(),
            sold_out_flag: false,
            variant: WineVariant::default(),
            vintage: None,
            grape: None,
            volume_liters: None,
            alcohol: None,
            rating: DEFAULT_RATING,
            category: None,
            image_url: None,
        }
    }
}

impl SyncedFields {
    /// Проверка обязательных полей перед записью в каталог
    pub fn validate(&self, external_id: &str) -> Result<(), ValidationError> {
        if external_id.trim().is_empty() {
            return Err(ValidationError::MissingExternalId);
        }
        match &self.title {
            Some(t) if !t.trim().is_empty() => {}
            _ => return Err(ValidationError::MissingTitle),
        }
        match self.price {
            None => return Err(ValidationError::MissingPrice),
            Some(p) if !p.is_finite() || p < 0.0 => return Err(ValidationError::InvalidPrice(p)),
            Some(_) => {}
        }
        if self.stock < 0 {
            return Err(ValidationError::NegativeStock(self.stock));
        }
        Ok(())
    }
}

/// Ошибка валидации товара
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingExternalId,
    MissingTitle,
    MissingPrice,
    InvalidPrice(f64),
    NegativeStock(i64),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingExternalId => write!(f, "missing required field 'externalId'"),
            Self::MissingTitle => write!(f, "missing required field 'title'"),
            Self::MissingPrice => write!(f, "missing required field 'price'"),
            Self::InvalidPrice(p) => write!(f, "invalid price {}", p),
            Self::NegativeStock(s) => write!(f, "negative stock {}", s),
        }
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Товар каталога (документ CMS).
///
/// `base.code` — slug, `base.description` — название вина.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(flatten)]
    pub base: BaseAggregate<ProductId>,

    /// Номер артикула в Winestro
    pub external_id: String,

    pub price: f64,
    pub stock: i64,
    pub status: ProductStatus,
    /// ERP пометила товар распроданным: остаток не возвращает его в продажу
    #[serde(default)]
    pub sold_out_flag: bool,
    pub variant: WineVariant,

    /// Год урожая
    pub vintage: Option<i32>,
    /// Сорт винограда
    pub grape: Option<String>,
    pub volume_liters: Option<f64>,
    /// Крепость, % об.
    pub alcohol: Option<f64>,

    pub rating: f64,
    pub category_ref: Option<String>,
    pub long_description: Option<String>,
    pub gallery: Vec<ImageRef>,

    pub origin: Origin,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Создать новый товар из данных ERP
    pub fn new_from_sync(
        external_id: &str,
        slug: String,
        fields: &SyncedFields,
    ) -> Result<Self, ValidationError> {
        fields.validate(external_id)?;

        let title = fields.title.clone().unwrap_or_default().trim().to_string();
        let mut base = BaseAggregate::new(ProductId::new_v4(), slug, title);
        base.metadata.is_posted = fields.status == ProductStatus::Active;

        let gallery = fields
            .image_url
            .iter()
            .filter(|url| !url.trim().is_empty())
            .map(|url| ImageRef {
                url: url.trim().to_string(),
                alt: fields.title.clone(),
            })
            .collect();

        Ok(Self {
            base,
            external_id: external_id.trim().to_string(),
            price: fields.price.unwrap_or_default(),
            stock: fields.stock,
            status: fields.status,
            sold_out_flag: fields.sold_out_flag,
            variant: fields.variant,
            vintage: fields.vintage,
            grape: fields.grape.clone(),
            volume_liters: fields.volume_liters,
            alcohol: fields.alcohol,
            rating: fields.rating,
            category_ref: fields.category.clone(),
            long_description: None,
            gallery,
            origin: Origin::Winestro,
            last_synced_at: Some(Utc::now()),
        })
    }

    pub fn slug(&self) -> &str {
        &self.base.code
    }

    pub fn title(&self) -> &str {
        &self.base.description
    }

    /// Отличаются ли синхронизируемые поля от данных ERP
    pub fn differs_from_sync(&self, fields: &SyncedFields) -> bool {
        let title = fields.title.as_deref().map(str::trim).unwrap_or_default();
        self.base.description != title
            || Some(self.price) != fields.price
            || self.stock != fields.stock
            || self.status != fields.status
            || self.sold_out_flag != fields.sold_out_flag
            || self.variant != fields.variant
            || self.vintage != fields.vintage
            || self.grape != fields.grape
            || self.volume_liters != fields.volume_liters
            || self.alcohol != fields.alcohol
            || self.base.metadata.is_deleted
    }

    /// Применить данные ERP к существующему документу.
    ///
    /// Меняются только поля, которыми владеет ERP; описание, галерея,
    /// рейтинг и категория остаются нетронутыми. Возвращает `false`,
    /// если менять было нечего.
    pub fn apply_sync(&mut self, fields: &SyncedFields) -> Result<bool, ValidationError> {
        fields.validate(&self.external_id)?;
        if !self.differs_from_sync(fields) {
            return Ok(false);
        }

        self.base.description = fields.title.clone().unwrap_or_default().trim().to_string();
        self.price = fields.price.unwrap_or_default();
        self.stock = fields.stock;
        self.status = fields.status;
        self.sold_out_flag = fields.sold_out_flag;
        self.variant = fields.variant;
        self.vintage = fields.vintage;
        self.grape = fields.grape.clone();
        self.volume_liters = fields.volume_liters;
        self.alcohol = fields.alcohol;
        self.base.metadata.is_posted = fields.status == ProductStatus::Active;
        if self.base.metadata.is_deleted {
            self.base.metadata.restore();
        }
        self.last_synced_at = Some(Utc::now());
        self.base.touch();
        self.base.metadata.increment_version();
        Ok(true)
    }

    /// Обновить только остаток. Статус переключается между
    /// `Active` и `SoldOut`; скрытые и архивные товары статус не меняют,
    /// помеченные в ERP распроданными остаются `SoldOut`.
    pub fn apply_stock(&mut self, stock: i64) -> bool {
        let stock = stock.max(0);
        let status = match self.status {
            ProductStatus::Active | ProductStatus::SoldOut if stock == 0 || self.sold_out_flag => {
                ProductStatus::SoldOut
            }
            ProductStatus::Active | ProductStatus::SoldOut => ProductStatus::Active,
            other => other,
        };
        if self.stock == stock && self.status == status {
            return false;
        }
        self.stock = stock;
        self.status = status;
        self.base.metadata.is_posted = status == ProductStatus::Active;
        self.last_synced_at = Some(Utc::now());
        self.base.touch();
        self.base.metadata.increment_version();
        true
    }

    /// Мягкое удаление по событию ERP
    pub fn archive(&mut self) {
        self.status = ProductStatus::Archived;
        self.base.metadata.is_posted = false;
        self.base.metadata.mark_deleted();
        self.base.metadata.increment_version();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn riesling() -> SyncedFields {
        SyncedFields {
            title: Some("Riesling 2022".to_string()),
            price: Some(12.5),
            stock: 30,
            status: ProductStatus::Active,
            variant: WineVariant::White,
            vintage: Some(2022),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_required_fields() {
        assert_eq!(riesling().validate("A100"), Ok(()));
        assert_eq!(
            riesling().validate("  "),
            Err(ValidationError::MissingExternalId)
        );

        let mut no_title = riesling();
        no_title.title = Some("   ".to_string());
        assert_eq!(no_title.validate("A100"), Err(ValidationError::MissingTitle));

        let mut no_price = riesling();
        no_price.price = None;
        assert_eq!(no_price.validate("A100"), Err(ValidationError::MissingPrice));

        let mut bad_price = riesling();
        bad_price.price = Some(-1.0);
        assert!(matches!(
            bad_price.validate("A100"),
            Err(ValidationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_apply_sync_keeps_curated_fields() {
        let mut product =
            Product::new_from_sync("A100", "riesling-2022".to_string(), &riesling()).unwrap();
        product.long_description = Some("Handverlesen".to_string());
        product.gallery = vec![ImageRef {
            url: "https://cdn.example/riesling.jpg".to_string(),
            alt: None,
        }];
        product.rating = 4.0;

        let mut fields = riesling();
        fields.price = Some(13.9);
        fields.stock = 12;
        assert_eq!(product.apply_sync(&fields), Ok(true));

        assert_eq!(product.price, 13.9);
        assert_eq!(product.stock, 12);
        assert_eq!(product.long_description.as_deref(), Some("Handverlesen"));
        assert_eq!(product.gallery.len(), 1);
        assert_eq!(product.rating, 4.0);
        assert_eq!(product.base.metadata.version, 1);

        // повторное применение тех же данных ничего не меняет
        assert_eq!(product.apply_sync(&fields), Ok(false));
        assert_eq!(product.base.metadata.version, 1);
    }

    #[test]
    fn test_apply_sync_restores_archived_product() {
        let mut product =
            Product::new_from_sync("A100", "riesling-2022".to_string(), &riesling()).unwrap();
        product.archive();
        assert!(product.base.metadata.is_deleted);

        assert_eq!(product.apply_sync(&riesling()), Ok(true));
        assert!(!product.base.metadata.is_deleted);
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[test]
    fn test_apply_stock_switches_status() {
        let mut product =
            Product::new_from_sync("A100", "riesling-2022".to_string(), &riesling()).unwrap();

        assert!(product.apply_stock(0));
        assert_eq!(product.status, ProductStatus::SoldOut);
        assert!(product.apply_stock(6));
        assert_eq!(product.status, ProductStatus::Active);
        assert!(!product.apply_stock(6));

        product.status = ProductStatus::Draft;
        assert!(product.apply_stock(0));
        assert_eq!(product.status, ProductStatus::Draft);
    }

    #[test]
    fn test_apply_stock_respects_sold_out_flag() {
        let mut fields = riesling();
        fields.status = ProductStatus::SoldOut;
        fields.sold_out_flag = true;
        fields.stock = 5;
        let mut product =
            Product::new_from_sync("A100", "riesling-2022".to_string(), &fields).unwrap();

        assert!(!product.apply_stock(5));
        assert!(product.apply_stock(8));
        assert_eq!(product.status, ProductStatus::SoldOut);
        assert!(!product.base.metadata.is_posted);

        // ERP сняла флаг: следующая полная синхронизация возвращает в продажу
        let mut fields = riesling();
        fields.stock = 8;
        assert_eq!(product.apply_sync(&fields), Ok(true));
        assert!(!product.sold_out_flag);
        assert!(product.apply_stock(3));
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[test]
    fn test_product_id_string_form() {
        let id = ProductId::new_v4();
        assert_eq!(ProductId::from_string(&id.as_string()), Ok(id));
        assert!(ProductId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_product_json_uses_camel_case() {
        let product =
            Product::new_from_sync("A100", "riesling-2022".to_string(), &riesling()).unwrap();
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["externalId"], "A100");
        assert_eq!(json["code"], "riesling-2022");
        assert_eq!(json["description"], "Riesling 2022");
        assert_eq!(json["status"], "active");
    }
}
