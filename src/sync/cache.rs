use crate::i18n::Language;
use std::collections::HashMap;
use std::sync::Arc;

/// Records already produced for one canonical record, keyed by language.
///
/// No eviction: the whole cache is cleared when the canonical record is
/// replaced, and the number of languages is small and fixed.
#[derive(Debug)]
pub struct LanguageCache<T> {
    entries: HashMap<Language, Arc<T>>,
}

impl<T> Default for LanguageCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> LanguageCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, language: Language) -> Option<Arc<T>> {
        self.entries.get(&language).cloned()
    }

    pub fn put(&mut self, language: Language, record: Arc<T>) {
        self.entries.insert(language, record);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, language: Language) -> bool {
        self.entries.contains_key(&language)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached language names, sorted.
    pub fn languages(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().map(|l| l.name()).collect();
        names.sort_unstable();
        names
    }
}
