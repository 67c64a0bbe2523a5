use crate::config::Settings;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Connection distance filter of a people search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkDistance {
    /// 1st degree connections
    #[serde(rename = "F")]
    First,

    /// 2nd degree connections
    #[serde(rename = "S")]
    Second,

    /// 3rd degree and beyond
    #[serde(rename = "B")]
    Beyond,
}

impl NetworkDistance {
    pub fn code(&self) -> &'static str {
        match self {
            Self::First => "F",
            Self::Second => "S",
            Self::Beyond => "B",
        }
    }

    /// Parses a single-letter code (`F`, `S`, `B`), case-insensitively
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "F" => Some(Self::First),
            "S" => Some(Self::Second),
            "B" => Some(Self::Beyond),
            _ => None,
        }
    }
}

/// Keywords plus optional filters of a people search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub keywords: String,

    #[serde(default)]
    pub network: Vec<NetworkDistance>,

    /// Geography URN ids
    #[serde(default)]
    pub geo_urn: Vec<String>,
}

impl SearchParams {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Default::default()
        }
    }

    pub fn with_network(mut self, network: impl IntoIterator<Item = NetworkDistance>) -> Self {
        self.network = network.into_iter().collect();
        self
    }

    pub fn with_geo_urn<S: Into<String>>(mut self, geo_urn: impl IntoIterator<Item = S>) -> Self {
        self.geo_urn = geo_urn.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the URL of one result page (1-based)
    ///
    /// List filters are sent as JSON arrays, e.g. `network=["S"]`.
    pub fn page_url(&self, settings: &Settings, page: usize) -> Result<String, ConfigError> {
        let base = settings.endpoint("search/results/people/");
        let mut url = Url::parse(&base).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", base, e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("keywords", &self.keywords);
            if !self.network.is_empty() {
                let codes: Vec<&str> = self.network.iter().map(|n| n.code()).collect();
                query.append_pair("network", &json_list(&codes));
            }
            if !self.geo_urn.is_empty() {
                query.append_pair("geoUrn", &json_list(&self.geo_urn));
            }
            query.append_pair("page", &page.to_string());
        }

        Ok(url.to_string())
    }
}

fn json_list<S: Serialize>(items: &[S]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
