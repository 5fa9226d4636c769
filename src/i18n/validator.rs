//! Translation quality checks.
//!
//! Diagnostic only: a report never rejects a translation, it is logged so
//! drift in the brand name, decision glyphs or figures shows up in traces.

use crate::catalogue::BRAND;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_warnings()
    }
}

pub struct TranslationValidator;

static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();

const GLYPHS: [&str; 3] = ["✅", "❌", "⚠"];

impl TranslationValidator {
    /// Compare an original text with its translation.
    ///
    /// Checks that:
    /// - the brand token survives
    /// - decision glyphs are kept
    /// - ASCII digit groups are unchanged (native-script digits are reported too)
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if original.contains(BRAND) && !translated.contains(BRAND) {
            report
                .warnings
                .push(format!("Brand token '{}' missing from translation", BRAND));
        }

        let orig_glyphs = Self::extract_glyphs(original);
        let trans_glyphs = Self::extract_glyphs(translated);
        if orig_glyphs != trans_glyphs {
            report.warnings.push(format!(
                "Glyph mismatch: original has {:?}, translation has {:?}",
                orig_glyphs, trans_glyphs
            ));
        }

        let orig_numbers = Self::extract_numbers(original);
        let trans_numbers = Self::extract_numbers(translated);
        if orig_numbers != trans_numbers {
            report.warnings.push(format!(
                "Number mismatch: original has {:?}, translation has {:?}",
                orig_numbers, trans_numbers
            ));
        }

        report
    }

    /// Validate every (original, translated) pair and collect the warnings.
    pub fn validate_all<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        for (original, translated) in pairs {
            report
                .warnings
                .extend(Self::validate(original, translated).warnings);
        }
        report
    }

    fn extract_glyphs(text: &str) -> Vec<&'static str> {
        GLYPHS
            .iter()
            .copied()
            .filter(|glyph| text.contains(glyph))
            .collect()
    }

    fn extract_numbers(text: &str) -> Vec<String> {
        let regex = NUMBER_REGEX.get_or_init(|| {
            Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("number pattern is valid")
        });

        regex
            .find_iter(text)
            .map(|m| m.as_str().replace(',', ""))
            .collect()
    }
}
