use serde::{Deserialize, Serialize};

/// Источник данных для агрегата
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// ERP винодельни Winestro
    Winestro,
    /// Создано вручную в админке CMS
    #[serde(rename = "self")]
    Self_,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Winestro => "winestro",
            Origin::Self_ => "self",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "winestro" => Origin::Winestro,
            _ => Origin::Self_,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
