//! Language registry: the single list of display languages the dashboard offers.
//!
//! Initialised once through `OnceLock` and immutable afterwards.

use serde::Serialize;
use std::sync::OnceLock;

/// Metadata for one display language.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    /// ISO 639-1 code (e.g. "hi")
    pub code: &'static str,

    /// English name, also used as the cache key and in prompts (e.g. "Hindi")
    pub name: &'static str,

    /// Name in its own script (e.g. "हिन्दी")
    pub native_name: &'static str,

    /// Whether records are generated in this language (exactly one is)
    pub is_canonical: bool,

    pub enabled: bool,
}

pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Look up by English name, ignoring case and surrounding whitespace.
    pub fn get_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        let name = name.trim();
        self.languages
            .iter()
            .find(|lang| lang.name.eq_ignore_ascii_case(name))
    }

    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// The language every canonical record is produced in.
    ///
    /// # Panics
    /// Panics unless exactly one language is marked canonical.
    pub fn canonical(&self) -> &LanguageConfig {
        let canonical_langs: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_canonical)
            .collect();

        match canonical_langs.len() {
            0 => panic!("No canonical language found in registry"),
            1 => canonical_langs[0],
            _ => panic!("Multiple canonical languages found in registry"),
        }
    }
}

fn lang(code: &'static str, name: &'static str, native_name: &'static str) -> LanguageConfig {
    LanguageConfig {
        code,
        name,
        native_name,
        is_canonical: false,
        enabled: true,
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            is_canonical: true,
            ..lang("en", "English", "English")
        },
        lang("hi", "Hindi", "हिन्दी"),
        lang("ta", "Tamil", "தமிழ்"),
        lang("te", "Telugu", "తెలుగు"),
        lang("kn", "Kannada", "ಕನ್ನಡ"),
        lang("bn", "Bengali", "বাংলা"),
        lang("mr", "Marathi", "मराठी"),
        lang("gu", "Gujarati", "ગુજરાતી"),
    ]
}
