//! Модели ответов Winestro.
//!
//! API отдаёт слабо типизированный JSON: числа приходят строками
//! (`"12,50"`), флаги — как `"1"`/`"ja"`, имена полей зависят от версии
//! выгрузки. Поэтому поля читаются вручную по списку допустимых ключей,
//! первый непустой выигрывает.

use serde::Serialize;
use serde_json::{Map, Value};

const ID_KEYS: &[&str] = &["artikelnr", "artikel_nr", "article_id", "id"];
const TITLE_KEYS: &[&str] = &["name", "bezeichnung", "artikelname", "title"];
const PRICE_KEYS: &[&str] = &["preis", "vk_preis", "price", "vk"];
const STOCK_KEYS: &[&str] = &["bestand", "lagerbestand", "stock", "menge"];
const ACTIVE_KEYS: &[&str] = &["aktiv", "shop_aktiv", "active"];
const SOLD_OUT_KEYS: &[&str] = &["ausverkauft", "sold_out"];
const VINTAGE_KEYS: &[&str] = &["jahrgang", "vintage"];
const GRAPE_KEYS: &[&str] = &["sorte", "rebsorte", "grape"];
const WINE_TYPE_KEYS: &[&str] = &["weinart", "farbe", "typ", "wine_type"];
const CATEGORY_KEYS: &[&str] = &["kategorie", "warengruppe", "category"];
const VOLUME_KEYS: &[&str] = &["liter", "volumen", "inhalt", "volume"];
const ALCOHOL_KEYS: &[&str] = &["alkohol", "alcohol"];
const IMAGE_KEYS: &[&str] = &["bild", "bild_url", "image_url", "image"];

/// Артикул Winestro (живёт только во время прогона)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExternalArticle {
    pub id: Option<String>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub active: Option<bool>,
    pub sold_out: Option<bool>,
    pub vintage: Option<i64>,
    pub grape: Option<String>,
    pub wine_type: Option<String>,
    pub category: Option<String>,
    pub volume_liters: Option<f64>,
    pub alcohol: Option<f64>,
    pub image_url: Option<String>,
}

impl ExternalArticle {
    /// Разобрать запись из ответа. Ошибка — если запись не JSON-объект
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected an object, got {}", json_kind(value)))?;

        Ok(Self {
            id: pick_string(obj, ID_KEYS),
            title: pick_string(obj, TITLE_KEYS),
            price: pick_f64(obj, PRICE_KEYS),
            stock: pick_i64(obj, STOCK_KEYS),
            active: pick_bool(obj, ACTIVE_KEYS),
            sold_out: pick_bool(obj, SOLD_OUT_KEYS),
            vintage: pick_i64(obj, VINTAGE_KEYS),
            grape: pick_string(obj, GRAPE_KEYS),
            wine_type: pick_string(obj, WINE_TYPE_KEYS),
            category: pick_string(obj, CATEGORY_KEYS),
            volume_liters: pick_f64(obj, VOLUME_KEYS),
            alcohol: pick_f64(obj, ALCOHOL_KEYS),
            image_url: pick_string(obj, IMAGE_KEYS),
        })
    }
}

/// Запись остатка из getBestand
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockRecord {
    pub article_id: String,
    pub stock: i64,
}

impl StockRecord {
    /// `None`, если у записи нет артикула или количества
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            article_id: pick_string(obj, ID_KEYS)?,
            stock: pick_i64(obj, STOCK_KEYS)?,
        })
    }
}

/// Номер артикула без полного разбора записи
pub fn article_id_of(value: &Value) -> Option<String> {
    value.as_object().and_then(|obj| pick_string(obj, ID_KEYS))
}

/// Похожа ли запись на артикул (есть ли у неё идентификатор)
pub fn looks_like_article(obj: &Map<String, Value>) -> bool {
    ID_KEYS.iter().any(|k| obj.contains_key(*k))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Vec<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter(|v| !v.is_null())
        .collect()
}

fn pick_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    pick(obj, keys).into_iter().find_map(lenient_string)
}

fn pick_f64(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    pick(obj, keys).into_iter().find_map(lenient_f64)
}

fn pick_i64(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    pick(obj, keys).into_iter().find_map(lenient_i64)
}

fn pick_bool(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    pick(obj, keys).into_iter().find_map(lenient_bool)
}

pub fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Число из `12.5`, `"12,50"`, `"1.234,50 €"`
pub fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('€')
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            let normalized = if cleaned.contains(',') {
                // немецкий формат: точка — разделитель тысяч
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned
            };
            normalized.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

pub fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(_) => lenient_f64(value).map(|f| f.trunc() as i64),
        _ => None,
    }
}

pub fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "ja" | "j" | "yes" | "y" | "x" => Some(true),
            "0" | "false" | "nein" | "n" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
