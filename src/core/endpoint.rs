/// Endpoint definitions probed by a run

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::finding::Section;

/// Expected body shape of an endpoint; selects the validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeTag {
    Status,
    SignalList,
    TradeList,
    MarketSnapshot,
    Balance,
    Verify,
    Leaderboard,
}

impl ShapeTag {
    /// Report section the validator Findings for this shape land in.
    /// Shallow shapes have no body section, their parse failures show under Endpoints.
    pub fn section(&self) -> Section {
        match self {
            ShapeTag::SignalList => Section::Signals,
            ShapeTag::TradeList => Section::Trades,
            ShapeTag::MarketSnapshot => Section::Market,
            ShapeTag::Balance => Section::Balance,
            ShapeTag::Status | ShapeTag::Verify | ShapeTag::Leaderboard => Section::Endpoints,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    pub shape: ShapeTag,
}

impl EndpointSpec {
    pub fn new(name: impl Into<String>, path: impl Into<String>, shape: ShapeTag) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            query: BTreeMap::new(),
            shape,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Full request URL: base URL joined with the path, query parameters appended
    pub fn url(&self, base_url: &str) -> Result<Url> {
        let full = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );

        let mut url = Url::parse(&full)
            .with_context(|| format!("Invalid URL for endpoint '{}': {}", self.name, full))?;

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}
