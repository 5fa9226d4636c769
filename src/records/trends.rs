//! Market news headlines.

use super::{ensure_len, pick, ShapeError, Translatable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound on attributed sources kept per trend set.
pub const MAX_SOURCES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendItem {
    #[serde(rename = "trend")]
    pub headline: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketTrendSet {
    pub trends: Vec<TrendItem>,
    pub sources: Vec<Source>,
}

impl MarketTrendSet {
    /// Build a set, keeping the first source per URI and at most [`MAX_SOURCES`].
    pub fn new(trends: Vec<TrendItem>, sources: Vec<Source>) -> Self {
        let mut seen = HashSet::new();
        let sources = sources
            .into_iter()
            .filter(|s| !s.uri.is_empty() && seen.insert(s.uri.clone()))
            .take(MAX_SOURCES)
            .collect();
        Self { trends, sources }
    }
}

/// Only the headlines travel to the translator; sources stay as fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsPayload {
    pub items: Vec<TrendItem>,
}

impl Translatable for MarketTrendSet {
    type Payload = TrendsPayload;
    type Translation = TrendsPayload;

    const PRODUCT: &'static str = "market_trends";

    fn to_payload(&self) -> TrendsPayload {
        TrendsPayload {
            items: self.trends.clone(),
        }
    }

    fn overlay(&self, translated: TrendsPayload) -> Result<Self, ShapeError> {
        ensure_len("items", self.trends.len(), translated.items.len())?;
        let trends = self
            .trends
            .iter()
            .zip(translated.items)
            .map(|(c, t)| TrendItem {
                headline: pick(t.headline, &c.headline),
                description: pick(t.description, &c.description),
            })
            .collect();
        Ok(Self {
            trends,
            sources: self.sources.clone(),
        })
    }
}
