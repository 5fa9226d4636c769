//! Crop demand forecast.

use super::{ensure_len, pick, Confidence, Graded, ShapeError, Translatable};
use anyhow::{anyhow, Result};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::warn;

/// Number of historical months the service is asked for.
pub const HISTORY_MONTHS: usize = 24;

// ==================== Wire Payload ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPayload {
    pub analysis_title: String,
    pub historical_data: Vec<HistoricalPointPayload>,
    pub forecast: OutlookPayload,
    pub recommendation: RecommendationPayload,
    pub why_recommendation: String,
    pub overview_summary: String,
    pub farmx_confidence: f64,
    pub data_sources: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPointPayload {
    pub month_year: String,
    pub price_per_quintal: f64,
    pub market_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlookPayload {
    pub expected_demand: String,
    pub price_range: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationPayload {
    pub decision: String,
    pub best_planting_time: String,
    pub best_selling_time: String,
    pub target_markets: String,
}

// ==================== Decision ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Grow,
    Avoid,
    Caution,
}

/// Glyph prefixes in match order; the bare warning sign comes last so the
/// variation-selector form is stripped whole.
const GLYPHS: [(&str, DecisionKind); 4] = [
    ("✅", DecisionKind::Grow),
    ("❌", DecisionKind::Avoid),
    ("⚠️", DecisionKind::Caution),
    ("⚠", DecisionKind::Caution),
];

impl DecisionKind {
    pub fn glyph(&self) -> &'static str {
        match self {
            DecisionKind::Grow => "✅",
            DecisionKind::Avoid => "❌",
            DecisionKind::Caution => "⚠️",
        }
    }

    pub fn canonical_label(&self) -> &'static str {
        match self {
            DecisionKind::Grow => "GROW",
            DecisionKind::Avoid => "AVOID",
            DecisionKind::Caution => "CAUTION",
        }
    }

    fn from_label(label: &str) -> Option<DecisionKind> {
        match label.trim().to_ascii_uppercase().as_str() {
            "GROW" => Some(DecisionKind::Grow),
            "AVOID" => Some(DecisionKind::Avoid),
            "CAUTION" => Some(DecisionKind::Caution),
            _ => None,
        }
    }
}

/// Split a leading decision glyph off `raw`.
fn split_glyph(raw: &str) -> Option<(DecisionKind, &str)> {
    let trimmed = raw.trim_start();
    GLYPHS.iter().find_map(|(glyph, kind)| {
        trimmed
            .strip_prefix(glyph)
            .map(|rest| (*kind, rest.trim_start_matches('\u{FE0F}').trim()))
    })
}

/// Grow/avoid/caution verdict: a fixed kind (which owns the glyph) plus a
/// translatable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub kind: DecisionKind,
    pub label: String,
}

impl Decision {
    pub fn canonical(kind: DecisionKind) -> Self {
        Self {
            kind,
            label: kind.canonical_label().to_string(),
        }
    }

    /// Parse the service's canonical form ("✅ GROW"); a bare label is accepted too.
    pub fn parse(raw: &str) -> Option<Decision> {
        if let Some((kind, rest)) = split_glyph(raw) {
            return match DecisionKind::from_label(rest) {
                Some(labelled) if labelled != kind => None,
                _ => Some(Decision::canonical(kind)),
            };
        }
        DecisionKind::from_label(raw).map(Decision::canonical)
    }

    pub fn glyph(&self) -> &'static str {
        self.kind.glyph()
    }

    /// Replace the label with translated text, discarding whatever glyph the
    /// translator put in front of it.
    pub(crate) fn relabel(&self, translated: &str) -> Decision {
        let text = match split_glyph(translated) {
            Some((_, rest)) => rest,
            None => translated.trim(),
        };
        Decision {
            kind: self.kind,
            label: pick(text.to_string(), &self.label),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.label)
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Decision", 3)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("glyph", self.glyph())?;
        state.serialize_field("label", &self.label)?;
        state.end()
    }
}

// ==================== Record ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub month: String,
    pub price_per_quintal: f64,
    pub market_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlook {
    pub demand: Graded,
    pub price_range: String,
    pub risk: Graded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub decision: Decision,
    pub planting_window: String,
    pub selling_window: String,
    pub target_markets: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    pub title: String,
    pub history: Vec<PricePoint>,
    pub outlook: Outlook,
    pub recommendation: Recommendation,
    pub rationale: String,
    pub overview: String,
    pub confidence: Confidence,
    pub data_sources: String,
}

impl ForecastRecord {
    pub fn confidence_percent(&self) -> u8 {
        self.confidence.percent()
    }
}

impl TryFrom<ForecastPayload> for ForecastRecord {
    type Error = anyhow::Error;

    fn try_from(payload: ForecastPayload) -> Result<Self> {
        if payload.historical_data.len() != HISTORY_MONTHS {
            warn!(
                "Forecast has {} historical months, expected {}",
                payload.historical_data.len(),
                HISTORY_MONTHS
            );
        }

        let decision = Decision::parse(&payload.recommendation.decision).ok_or_else(|| {
            anyhow!(
                "Unrecognised recommendation decision '{}'",
                payload.recommendation.decision
            )
        })?;

        Ok(Self {
            title: payload.analysis_title,
            history: payload
                .historical_data
                .into_iter()
                .map(|p| PricePoint {
                    month: p.month_year,
                    price_per_quintal: p.price_per_quintal,
                    market_status: p.market_status,
                })
                .collect(),
            outlook: Outlook {
                demand: Graded::parse_canonical("expectedDemand", &payload.forecast.expected_demand)?,
                price_range: payload.forecast.price_range,
                risk: Graded::parse_canonical("riskLevel", &payload.forecast.risk_level)?,
            },
            recommendation: Recommendation {
                decision,
                planting_window: payload.recommendation.best_planting_time,
                selling_window: payload.recommendation.best_selling_time,
                target_markets: payload.recommendation.target_markets,
            },
            rationale: payload.why_recommendation,
            overview: payload.overview_summary,
            confidence: Confidence::from_raw(payload.farmx_confidence),
            data_sources: payload.data_sources,
        })
    }
}

impl Translatable for ForecastRecord {
    type Payload = ForecastPayload;
    type Translation = ForecastPayload;

    const PRODUCT: &'static str = "forecast";

    fn to_payload(&self) -> ForecastPayload {
        ForecastPayload {
            analysis_title: self.title.clone(),
            historical_data: self
                .history
                .iter()
                .map(|p| HistoricalPointPayload {
                    month_year: p.month.clone(),
                    price_per_quintal: p.price_per_quintal,
                    market_status: p.market_status.clone(),
                })
                .collect(),
            forecast: OutlookPayload {
                expected_demand: self.outlook.demand.label.clone(),
                price_range: self.outlook.price_range.clone(),
                risk_level: self.outlook.risk.label.clone(),
            },
            recommendation: RecommendationPayload {
                decision: self.recommendation.decision.to_string(),
                best_planting_time: self.recommendation.planting_window.clone(),
                best_selling_time: self.recommendation.selling_window.clone(),
                target_markets: self.recommendation.target_markets.clone(),
            },
            why_recommendation: self.rationale.clone(),
            overview_summary: self.overview.clone(),
            farmx_confidence: self.confidence.fraction(),
            data_sources: self.data_sources.clone(),
        }
    }

    fn overlay(&self, translated: ForecastPayload) -> Result<Self, ShapeError> {
        ensure_len(
            "historicalData",
            self.history.len(),
            translated.historical_data.len(),
        )?;

        let history = self
            .history
            .iter()
            .zip(translated.historical_data)
            .map(|(canonical, t)| PricePoint {
                month: pick(t.month_year, &canonical.month),
                price_per_quintal: canonical.price_per_quintal,
                market_status: pick(t.market_status, &canonical.market_status),
            })
            .collect();

        Ok(Self {
            title: pick(translated.analysis_title, &self.title),
            history,
            outlook: Outlook {
                demand: self.outlook.demand.relabel(translated.forecast.expected_demand),
                price_range: pick(translated.forecast.price_range, &self.outlook.price_range),
                risk: self.outlook.risk.relabel(translated.forecast.risk_level),
            },
            recommendation: Recommendation {
                decision: self
                    .recommendation
                    .decision
                    .relabel(&translated.recommendation.decision),
                planting_window: pick(
                    translated.recommendation.best_planting_time,
                    &self.recommendation.planting_window,
                ),
                selling_window: pick(
                    translated.recommendation.best_selling_time,
                    &self.recommendation.selling_window,
                ),
                target_markets: pick(
                    translated.recommendation.target_markets,
                    &self.recommendation.target_markets,
                ),
            },
            rationale: pick(translated.why_recommendation, &self.rationale),
            overview: pick(translated.overview_summary, &self.overview),
            confidence: self.confidence,
            data_sources: pick(translated.data_sources, &self.data_sources),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::records::Level;

    pub(crate) fn sample_payload() -> ForecastPayload {
        ForecastPayload {
            analysis_title: "Wheat in Punjab".to_string(),
            historical_data: (0..HISTORY_MONTHS)
                .map(|i| HistoricalPointPayload {
                    month_year: format!("Month {}", i + 1),
                    price_per_quintal: 2000.0 + i as f64 * 10.0,
                    market_status: "Stable".to_string(),
                })
                .collect(),
            forecast: OutlookPayload {
                expected_demand: "High".to_string(),
                price_range: "₹2,200 - ₹2,450".to_string(),
                risk_level: "Low".to_string(),
            },
            recommendation: RecommendationPayload {
                decision: "✅ GROW".to_string(),
                best_planting_time: "November".to_string(),
                best_selling_time: "April".to_string(),
                target_markets: "Khanna Mandi".to_string(),
            },
            why_recommendation: "Strong MSP support.".to_string(),
            overview_summary: "Demand remains firm.".to_string(),
            farmx_confidence: 0.85,
            data_sources: "APMC data".to_string(),
        }
    }

    pub(crate) fn sample_record() -> ForecastRecord {
        ForecastRecord::try_from(sample_payload()).expect("sample payload is canonical")
    }

    // ==================== Decision Tests ====================

    #[test]
    fn test_decision_parse_canonical_forms() {
        assert_eq!(Decision::parse("✅ GROW").unwrap().kind, DecisionKind::Grow);
        assert_eq!(Decision::parse("❌ AVOID").unwrap().kind, DecisionKind::Avoid);
        assert_eq!(
            Decision::parse("⚠️ CAUTION").unwrap().kind,
            DecisionKind::Caution
        );
    }

    #[test]
    fn test_decision_parse_bare_label_and_bare_warning_sign() {
        assert_eq!(Decision::parse("caution").unwrap().kind, DecisionKind::Caution);
        assert_eq!(Decision::parse("⚠ CAUTION").unwrap().kind, DecisionKind::Caution);
    }

    #[test]
    fn test_decision_parse_rejects_conflicting_glyph_and_label() {
        assert!(Decision::parse("✅ AVOID").is_none());
        assert!(Decision::parse("MAYBE").is_none());
    }

    #[test]
    fn test_decision_display_includes_glyph() {
        assert_eq!(Decision::canonical(DecisionKind::Avoid).to_string(), "❌ AVOID");
    }

    #[test]
    fn test_decision_relabel_keeps_kind_and_glyph() {
        let decision = Decision::canonical(DecisionKind::Grow);
        let translated = decision.relabel("✅ उगाएं");
        assert_eq!(translated.kind, DecisionKind::Grow);
        assert_eq!(translated.label, "उगाएं");
        assert_eq!(translated.to_string(), "✅ उगाएं");
    }

    #[test]
    fn test_decision_relabel_ignores_wrong_glyph_from_translator() {
        let decision = Decision::canonical(DecisionKind::Caution);
        let translated = decision.relabel("❌ सावधानी");
        assert_eq!(translated.kind, DecisionKind::Caution);
        assert_eq!(translated.to_string(), "⚠️ सावधानी");
    }

    #[test]
    fn test_decision_serializes_kind_glyph_label() {
        let json = serde_json::to_value(Decision::canonical(DecisionKind::Grow)).unwrap();
        assert_eq!(json["kind"], "GROW");
        assert_eq!(json["glyph"], "✅");
        assert_eq!(json["label"], "GROW");
    }

    // ==================== Canonical Conversion Tests ====================

    #[test]
    fn test_try_from_payload() {
        let record = sample_record();
        assert_eq!(record.history.len(), HISTORY_MONTHS);
        assert_eq!(record.outlook.demand.level, Level::High);
        assert_eq!(record.outlook.risk.level, Level::Low);
        assert_eq!(record.confidence_percent(), 85);
    }

    #[test]
    fn test_try_from_percentage_confidence() {
        let mut payload = sample_payload();
        payload.farmx_confidence = 87.0;
        let record = ForecastRecord::try_from(payload).unwrap();
        assert_eq!(record.confidence_percent(), 87);
    }

    #[test]
    fn test_try_from_rejects_unknown_level() {
        let mut payload = sample_payload();
        payload.forecast.risk_level = "Extreme".to_string();
        let err = ForecastRecord::try_from(payload).unwrap_err();
        assert!(err.to_string().contains("riskLevel"));
    }

    #[test]
    fn test_try_from_rejects_unknown_decision() {
        let mut payload = sample_payload();
        payload.recommendation.decision = "PLANT".to_string();
        assert!(ForecastRecord::try_from(payload).is_err());
    }

    #[test]
    fn test_payload_deserializes_from_service_json() {
        let json = serde_json::to_string(&sample_payload()).unwrap();
        assert!(json.contains("analysisTitle"));
        assert!(json.contains("pricePerQuintal"));
        let parsed: ForecastPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample_payload());
    }

    // ==================== Overlay Tests ====================

    #[test]
    fn test_overlay_translates_text_and_keeps_numbers() {
        let canonical = sample_record();
        let mut translated = canonical.to_payload();
        translated.analysis_title = "पंजाब में गेहूं".to_string();
        translated.forecast.expected_demand = "उच्च".to_string();
        translated.recommendation.decision = "✅ उगाएं".to_string();
        for point in &mut translated.historical_data {
            point.price_per_quintal = 1.0;
            point.month_year = "जनवरी".to_string();
        }
        translated.farmx_confidence = 0.1;

        let record = canonical.overlay(translated).unwrap();
        assert_eq!(record.title, "पंजाब में गेहूं");
        assert_eq!(record.outlook.demand.level, Level::High);
        assert_eq!(record.outlook.demand.label, "उच्च");
        assert_eq!(record.recommendation.decision.glyph(), "✅");
        assert_eq!(record.confidence, canonical.confidence);
        for (t, c) in record.history.iter().zip(&canonical.history) {
            assert_eq!(t.price_per_quintal, c.price_per_quintal);
            assert_eq!(t.month, "जनवरी");
        }
    }

    #[test]
    fn test_overlay_rejects_truncated_history() {
        let canonical = sample_record();
        let mut translated = canonical.to_payload();
        translated.historical_data.truncate(12);
        let err = canonical.overlay(translated).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::LengthMismatch {
                field: "historicalData",
                expected: 24,
                actual: 12
            }
        ));
    }
}
