//! Translated UI strings for the selected display language.

use crate::i18n::Language;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Bidirectional map between canonical English keys and their display form.
///
/// An empty set means "show English": [`UiTextSet::t`] falls back to the key.
/// A set is always replaced wholesale on a language change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiTextSet {
    language: Language,
    texts: BTreeMap<String, String>,
    #[serde(skip)]
    reverse: HashMap<String, String>,
}

impl UiTextSet {
    /// The English set: no entries.
    pub fn english() -> Self {
        Self::default()
    }

    /// Build a set from (key, translated) pairs. Blank translations are skipped;
    /// when two keys share a translation, reverse lookup resolves to the first.
    pub fn from_pairs(
        language: Language,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut texts = BTreeMap::new();
        let mut reverse = HashMap::new();
        for (key, value) in pairs {
            if value.trim().is_empty() || texts.contains_key(&key) {
                continue;
            }
            reverse.entry(value.clone()).or_insert_with(|| key.clone());
            texts.insert(key, value);
        }
        Self {
            language,
            texts,
            reverse,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Display form of `key`, or the key itself when untranslated.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.display(key).unwrap_or(key)
    }

    /// Display form of `key` only when this set has an entry for it.
    pub fn display(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }

    /// English key a displayed string came from.
    ///
    /// A string this set never produced is returned unchanged: it is either
    /// already English or a custom value typed by the user.
    pub fn canonical_key<'a>(&'a self, display: &'a str) -> &'a str {
        self.reverse.get(display).map(String::as_str).unwrap_or(display)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.texts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
