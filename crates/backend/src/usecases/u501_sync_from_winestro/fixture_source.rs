use super::winestro_api_client::{extract_list, parse_body, ErpSource, WinestroError, ARTICLE_LIST_KEYS};
use super::winestro_models::{article_id_of, lenient_i64};
use crate::shared::config::WinestroConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Встроенный тестовый каталог для `data_source = "mock"`
const SAMPLE_CATALOG: &str = r#"{
  "artikel": [
    {
      "artikelnr": "A100",
      "name": "Riesling 2022",
      "preis": "12,50",
      "bestand": 30,
      "aktiv": "1",
      "jahrgang": 2022,
      "sorte": "Riesling",
      "weinart": "Weißwein",
      "liter": "0,75",
      "alkohol": "12,0",
      "kategorie": "weisswein"
    },
    {
      "artikelnr": "A101",
      "name": "Spätburgunder trocken",
      "preis": "16,90",
      "bestand": "12",
      "aktiv": "ja",
      "jahrgang": "2020",
      "sorte": "Spätburgunder",
      "weinart": "Rotwein",
      "liter": "0,75",
      "alkohol": "13,5",
      "kategorie": "rotwein"
    },
    {
      "artikelnr": "A102",
      "name": "Rosé Secco",
      "preis": "9,90",
      "bestand": 0,
      "aktiv": "1",
      "weinart": "Secco",
      "liter": "0,75",
      "kategorie": "sekt-secco"
    },
    {
      "artikelnr": "A103",
      "name": "Riesling Auslese edelsüß",
      "preis": "24,00",
      "bestand": 6,
      "aktiv": "0",
      "jahrgang": 2019,
      "sorte": "Riesling",
      "weinart": "Dessertwein",
      "liter": "0,375"
    }
  ]
}"#;

/// Источник артикулов из JSON-файла или встроенного примера.
/// Ответ имеет ту же форму, что и у боевого API.
pub struct FixtureSource {
    articles: Vec<Value>,
}

impl FixtureSource {
    pub fn from_value(body: Value) -> Result<Self, WinestroError> {
        Ok(Self {
            articles: extract_list(body, ARTICLE_LIST_KEYS)?,
        })
    }

    pub fn from_json(body: &str) -> Result<Self, WinestroError> {
        Self::from_value(parse_body(body)?)
    }

    pub fn sample() -> Result<Self, WinestroError> {
        Self::from_json(SAMPLE_CATALOG)
    }

    /// Файл из `winestro.mock_data_path`, иначе встроенный каталог
    pub fn from_config(config: &WinestroConfig) -> Result<Self, WinestroError> {
        match config.mock_data_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => {
                let body = std::fs::read_to_string(path).map_err(|e| {
                    WinestroError::Config(format!("cannot read mock data '{}': {}", path, e))
                })?;
                let source = Self::from_json(&body)?;
                tracing::info!("Mock Winestro catalog loaded from {} ({} articles)", path, source.articles.len());
                Ok(source)
            }
            None => {
                tracing::info!("Using embedded sample Winestro catalog");
                Self::sample()
            }
        }
    }
}

#[async_trait]
impl ErpSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_articles(&self) -> Result<Vec<Value>, WinestroError> {
        Ok(self.articles.clone())
    }

    async fn fetch_article(&self, article_id: &str) -> Result<Option<Value>, WinestroError> {
        Ok(self
            .articles
            .iter()
            .find(|a| article_id_of(a).as_deref() == Some(article_id))
            .cloned())
    }

    async fn fetch_stock(&self) -> Result<Vec<Value>, WinestroError> {
        let records = self
            .articles
            .iter()
            .filter_map(|a| {
                let id = article_id_of(a)?;
                let stock = ["bestand", "lagerbestand", "stock"]
                    .iter()
                    .find_map(|k| a.get(*k).and_then(lenient_i64))?;
                Some(json!({"artikelnr": id, "bestand": stock}))
            })
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_catalog() {
        let source = FixtureSource::sample().unwrap();
        assert_eq!(source.fetch_articles().await.unwrap().len(), 4);
        assert_eq!(source.probe().await.unwrap(), 4);

        let article = source.fetch_article("A101").await.unwrap().unwrap();
        assert_eq!(article["name"], "Spätburgunder trocken");
        assert!(source.fetch_article("ZZZ").await.unwrap().is_none());

        let stock = source.fetch_stock().await.unwrap();
        assert_eq!(stock.len(), 4);
        assert_eq!(stock[1], json!({"artikelnr": "A101", "bestand": 12}));
    }

    #[test]
    fn test_missing_mock_file_is_config_error() {
        let mut cfg = crate::shared::config::test_config().winestro;
        cfg.mock_data_path = Some("/nonexistent/winestro.json".to_string());
        assert!(matches!(
            FixtureSource::from_config(&cfg),
            Err(WinestroError::Config(_))
        ));
    }
}
