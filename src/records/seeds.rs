//! Seed variety recommendations.

use super::{overlay_strings, pick, ShapeError, Translatable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedInfo {
    pub variety_name: String,
    pub suitability_reason: String,
    pub yield_range: String,
    pub resistance_traits: Vec<String>,
    pub maturity_duration: String,
    pub cost_range: String,
    pub performance_tip: String,
}

impl SeedInfo {
    fn overlay(&self, field: &'static str, t: SeedInfo) -> Result<SeedInfo, ShapeError> {
        Ok(SeedInfo {
            variety_name: pick(t.variety_name, &self.variety_name),
            suitability_reason: pick(t.suitability_reason, &self.suitability_reason),
            yield_range: pick(t.yield_range, &self.yield_range),
            resistance_traits: overlay_strings(field, &self.resistance_traits, t.resistance_traits)?,
            maturity_duration: pick(t.maturity_duration, &self.maturity_duration),
            cost_range: pick(t.cost_range, &self.cost_range),
            performance_tip: pick(t.performance_tip, &self.performance_tip),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeedTier {
    BestMatch,
    Alternative,
    Budget,
}

impl SeedTier {
    /// UI text key for the tier badge.
    pub fn title(&self) -> &'static str {
        match self {
            SeedTier::BestMatch => "Best Match",
            SeedTier::Alternative => "Alternative Option",
            SeedTier::Budget => "Budget Friendly",
        }
    }
}

/// Exactly three varieties, one per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRecommendationSet {
    pub best_match: SeedInfo,
    pub alternative: SeedInfo,
    pub budget: SeedInfo,
}

impl SeedRecommendationSet {
    pub fn tiers(&self) -> [(SeedTier, &SeedInfo); 3] {
        [
            (SeedTier::BestMatch, &self.best_match),
            (SeedTier::Alternative, &self.alternative),
            (SeedTier::Budget, &self.budget),
        ]
    }
}

impl Translatable for SeedRecommendationSet {
    type Payload = SeedRecommendationSet;
    type Translation = SeedRecommendationSet;

    const PRODUCT: &'static str = "seed_recommendation";

    fn to_payload(&self) -> SeedRecommendationSet {
        self.clone()
    }

    fn overlay(&self, translated: SeedRecommendationSet) -> Result<Self, ShapeError> {
        Ok(Self {
            best_match: self
                .best_match
                .overlay("bestMatch.resistanceTraits", translated.best_match)?,
            alternative: self
                .alternative
                .overlay("alternative.resistanceTraits", translated.alternative)?,
            budget: self
                .budget
                .overlay("budget.resistanceTraits", translated.budget)?,
        })
    }
}
