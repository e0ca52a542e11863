use super::winestro_models::ExternalArticle;
use contracts::domain::a001_product::{ProductStatus, SyncedFields, WineVariant, DEFAULT_RATING};

/// Ключевые слова типа вина. Порядок важен: «Rosé Secco» — игристое,
/// «Rotwein edelsüß» — десертное
const VARIANT_KEYWORDS: &[(WineVariant, &[&str])] = &[
    (
        WineVariant::Sparkling,
        &["sekt", "secco", "perl", "sparkling", "crémant", "cremant", "schaumwein"],
    ),
    (
        WineVariant::Dessert,
        &["edelsüß", "edelsuess", "süß", "suess", "dessert", "likör", "likoer", "eiswein"],
    ),
    (WineVariant::Rose, &["rosé", "rose", "weißherbst", "weissherbst"]),
    (WineVariant::White, &["weiß", "weiss", "white", "blanc"]),
    (WineVariant::Red, &["rot", "red", "rouge"]),
];

/// Преобразовать артикул Winestro в синхронизируемые поля товара.
///
/// Обязательность полей здесь не проверяется: пустое название или
/// отсутствующая цена отсекаются валидацией при записи.
pub fn map_article(article: &ExternalArticle) -> SyncedFields {
    let title = article
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let price = article.price.map(round_to_cents);
    let stock = article.stock.unwrap_or(0).max(0);
    let active = article.active.unwrap_or(true);
    let sold_out = article.sold_out.unwrap_or(false);

    let status = if !active {
        ProductStatus::Draft
    } else if sold_out || stock == 0 {
        ProductStatus::SoldOut
    } else {
        ProductStatus::Active
    };

    SyncedFields {
        title,
        price,
        stock,
        status,
        sold_out_flag: sold_out,
        variant: detect_variant(article.wine_type.as_deref(), article.title.as_deref()),
        vintage: article
            .vintage
            .filter(|y| (1800..=2200).contains(y))
            .map(|y| y as i32),
        grape: article.grape.clone(),
        volume_liters: article.volume_liters.filter(|v| *v > 0.0),
        alcohol: article.alcohol.filter(|a| *a > 0.0),
        rating: DEFAULT_RATING,
        category: article.category.clone(),
        image_url: article.image_url.clone(),
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Тип вина по полю weinart, при его отсутствии по названию
pub fn detect_variant(wine_type: Option<&str>, title: Option<&str>) -> WineVariant {
    [wine_type, title]
        .into_iter()
        .flatten()
        .map(|text| variant_from_keywords(&text.to_lowercase()))
        .find(|v| *v != WineVariant::Other)
        .unwrap_or_default()
}

fn variant_from_keywords(text: &str) -> WineVariant {
    VARIANT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(variant, _)| *variant)
        .unwrap_or_default()
}
