//! Data products produced by the generation service.
//!
//! Every product has a canonical (English) record that is the source of
//! truth, plus a wire payload used to talk to the service. Translated
//! records are never parsed from scratch: the translated payload is laid
//! over a clone of the canonical record, so numbers, levels, decision kinds
//! and chat ids cannot drift.

mod chat;
mod forecast;
mod grade;
mod pest;
mod seeds;
mod trends;

pub use chat::{ChatMessage, ChatPayload, ChatRole, ChatTranscript, ChatTranslation};
pub use forecast::{
    Decision, DecisionKind, ForecastPayload, ForecastRecord, HistoricalPointPayload, Outlook,
    OutlookPayload, PricePoint, Recommendation, RecommendationPayload, HISTORY_MONTHS,
};
pub use grade::{Confidence, Graded, Level};
pub use pest::{PestDiagnosis, PestPayload};
pub use seeds::{SeedInfo, SeedRecommendationSet, SeedTier};
pub use trends::{MarketTrendSet, Source, TrendItem, TrendsPayload, MAX_SOURCES};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A translated payload that cannot be laid over its canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{field}: expected {expected} entries, translation has {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// A record that can be sent through the translation gateway.
pub trait Translatable: Clone + Send + Sync + 'static {
    /// What is sent to the service.
    type Payload: Serialize + Send;
    /// What the service is expected to send back.
    type Translation: DeserializeOwned + Send;

    /// Short product name used in logs and metrics.
    const PRODUCT: &'static str;

    fn to_payload(&self) -> Self::Payload;

    /// Build the translated record from `self` (canonical) and the service output.
    fn overlay(&self, translated: Self::Translation) -> Result<Self, ShapeError>;
}

/// Keep the translated text unless the service returned nothing useful.
pub(crate) fn pick(translated: String, canonical: &str) -> String {
    if translated.trim().is_empty() {
        canonical.to_string()
    } else {
        translated
    }
}

pub(crate) fn ensure_len(
    field: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), ShapeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ShapeError::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

/// Overlay a list of translated strings onto canonical ones, position by position.
pub(crate) fn overlay_strings(
    field: &'static str,
    canonical: &[String],
    translated: Vec<String>,
) -> Result<Vec<String>, ShapeError> {
    ensure_len(field, canonical.len(), translated.len())?;
    Ok(translated
        .into_iter()
        .zip(canonical)
        .map(|(t, c)| pick(t, c))
        .collect())
}
