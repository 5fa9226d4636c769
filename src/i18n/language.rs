//! Validated display language.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// A display language known to the registry.
///
/// Only constructible through the registry, so every value is valid.
/// Serializes as its English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const HINDI: Language = Language { code: "hi" };
    pub const TAMIL: Language = Language { code: "ta" };
    pub const KANNADA: Language = Language { code: "kn" };

    /// Create a Language from its ISO 639-1 code.
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            Some(_) => bail!("Language '{}' is not enabled", code),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// Create a Language from its English name, as the UI selector sends it.
    pub fn from_name(name: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_name(name) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            Some(_) => bail!("Language '{}' is not enabled", name),
            None => bail!("Unknown language: '{}'", name),
        }
    }

    pub fn canonical() -> Language {
        Language {
            code: LanguageRegistry::get().canonical().code,
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// # Panics
    /// Never for values built through this type's constructors.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English name; this is the key every cache is indexed by.
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn is_canonical(&self) -> bool {
        self.config().is_canonical
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::canonical()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Constant Tests ====================

    #[test]
    fn test_english_constant() {
        assert_eq!(Language::ENGLISH.name(), "English");
        assert!(Language::ENGLISH.is_canonical());
    }

    #[test]
    fn test_constants_resolve_in_registry() {
        for lang in [
            Language::ENGLISH,
            Language::HINDI,
            Language::TAMIL,
            Language::KANNADA,
        ] {
            assert_eq!(Language::from_code(lang.code()).unwrap(), lang);
        }
    }

    // ==================== Constructor Tests ====================

    #[test]
    fn test_from_name_hindi() {
        let hindi = Language::from_name("Hindi").unwrap();
        assert_eq!(hindi, Language::HINDI);
        assert_eq!(hindi.native_name(), "हिन्दी");
        assert!(!hindi.is_canonical());
    }

    #[test]
    fn test_from_name_unknown() {
        let err = Language::from_name("Klingon").unwrap_err();
        assert!(err.to_string().contains("Unknown language"));
    }

    #[test]
    fn test_from_code_invalid() {
        assert!(Language::from_code("fr").is_err());
        assert!(Language::from_code("").is_err());
    }

    #[test]
    fn test_canonical_is_default() {
        assert_eq!(Language::default(), Language::ENGLISH);
        assert_eq!(Language::canonical(), Language::ENGLISH);
    }

    // ==================== Trait Tests ====================

    #[test]
    fn test_display_and_serialize_use_name() {
        assert_eq!(Language::TAMIL.to_string(), "Tamil");
        assert_eq!(serde_json::to_string(&Language::KANNADA).unwrap(), "\"Kannada\"");
    }

    #[test]
    fn test_usable_as_map_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(Language::HINDI, 1);
        assert_eq!(map.get(&Language::from_name("hindi").unwrap()), Some(&1));
    }
}
