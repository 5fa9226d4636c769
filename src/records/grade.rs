//! Closed three-level scales and confidence values shared by several records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical three-level scale used for demand, risk and pest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    /// English label as produced by the generation service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Medium => "Medium",
            Level::Low => "Low",
        }
    }

    /// Parse a canonical (English) label. Case and surrounding whitespace are ignored.
    pub fn parse(label: &str) -> Option<Level> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Level::High),
            "medium" => Some(Level::Medium),
            "low" => Some(Level::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A level together with the label shown to the user.
///
/// The level never changes after the canonical fetch; translation only
/// replaces `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graded {
    pub level: Level,
    pub label: String,
}

impl Graded {
    pub fn canonical(level: Level) -> Self {
        Self {
            level,
            label: level.as_str().to_string(),
        }
    }

    /// Parse a canonical label, naming the field in the error.
    pub fn parse_canonical(field: &str, raw: &str) -> anyhow::Result<Self> {
        Level::parse(raw)
            .map(Self::canonical)
            .ok_or_else(|| anyhow::anyhow!("{} must be High, Medium or Low, got '{}'", field, raw))
    }

    pub(crate) fn relabel(&self, translated: String) -> Self {
        Self {
            level: self.level,
            label: super::pick(translated, &self.label),
        }
    }
}

/// A confidence value normalised to the 0.0-1.0 range.
///
/// Producers sometimes emit a percentage (`87`) instead of a fraction (`0.87`);
/// anything above 1.0 is read as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn from_raw(raw: f64) -> Self {
        if !raw.is_finite() {
            return Self(0.0);
        }
        let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
        Self(fraction.clamp(0.0, 1.0))
    }

    pub fn fraction(&self) -> f64 {
        self.0
    }

    /// Whole-number percentage for display.
    pub fn percent(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}
