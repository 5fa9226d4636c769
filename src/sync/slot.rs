//! Raw-data store and display state for one data product.
//!
//! Every canonical fetch bumps a generation counter. Fetch tickets and
//! translation jobs carry the generation they were issued under, and a
//! result whose generation no longer matches is dropped on commit. This is
//! the only cancellation there is: calls are never aborted, their results
//! are ignored.
//!
//! A selection that finds its language already being translated gets a
//! [`Waiter`] instead of a second job, and can hold its own commit back
//! until that translation has landed.

use super::LanguageCache;
use crate::error::AdvisorError;
use crate::i18n::{Language, TranslationMetrics};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Proof that a canonical fetch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// A translation to run outside the session lock.
#[derive(Debug, Clone)]
pub struct TranslationJob<T> {
    generation: u64,
    pub language: Language,
    /// The canonical record to translate
    pub record: Arc<T>,
}

/// Handle on a translation some other task is already running.
#[derive(Debug)]
pub struct Waiter {
    generation: u64,
    language: Language,
    landed: watch::Receiver<u64>,
}

impl Waiter {
    pub fn language(&self) -> Language {
        self.language
    }

    /// Wait until the slot stores a translation or drops its record.
    /// Check [`ProductSlot::landing`] afterwards; it may not be this one.
    pub async fn changed(&mut self) -> bool {
        self.landed.changed().await.is_ok()
    }
}

/// Where a waited-on translation stands.
#[derive(Debug)]
pub enum Landing<T> {
    Running,
    Show(Ready<T>),
    /// The record was replaced or the translation abandoned.
    Gone,
}

/// What a language selection needs.
#[derive(Debug)]
pub enum Plan<T> {
    /// No canonical record yet.
    Idle,
    /// Ready to display now: the canonical record or a cached translation.
    Show(Ready<T>),
    /// No cached record; run the job and commit it.
    Translate(TranslationJob<T>),
    /// A translation to this language is already running.
    Pending(Waiter),
}

/// A record to display, held back until the caller commits it.
#[derive(Debug)]
pub struct Ready<T> {
    generation: u64,
    language: Language,
    record: Arc<T>,
}

impl<T> Ready<T> {
    pub fn language(&self) -> Language {
        self.language
    }
}

/// What happened to a finished canonical fetch.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// A newer fetch replaced this one.
    Stale,
    Displayed,
    /// The display language is not English; translate before display.
    Translate(TranslationJob<T>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The canonical record was replaced while the job ran.
    Stale,
    /// Cached, but a different language is now selected.
    Cached,
    Displayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "language", rename_all = "camelCase")]
pub enum Phase {
    Empty,
    Fetching,
    Translating(Language),
    Ready(Language),
}

/// Serializable snapshot of a slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView<T> {
    pub phase: Phase,
    pub loading: bool,
    pub error: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug)]
pub struct ProductSlot<T> {
    generation: u64,
    raw: Option<Arc<T>>,
    cache: LanguageCache<T>,
    displayed: Option<(Language, Arc<T>)>,
    target: Language,
    pending: HashSet<Language>,
    fetching: bool,
    error: Option<AdvisorError>,
    /// Bumped whenever a translation lands or the record is dropped
    landed: watch::Sender<u64>,
}

impl<T> ProductSlot<T> {
    pub fn new(language: Language) -> Self {
        Self {
            generation: 0,
            raw: None,
            cache: LanguageCache::new(),
            displayed: None,
            target: language,
            pending: HashSet::new(),
            fetching: false,
            error: None,
            landed: watch::channel(0).0,
        }
    }

    pub fn raw(&self) -> Option<&Arc<T>> {
        self.raw.as_ref()
    }

    pub fn displayed(&self) -> Option<&T> {
        self.displayed.as_ref().map(|(_, record)| record.as_ref())
    }

    pub fn displayed_language(&self) -> Option<Language> {
        self.displayed.as_ref().map(|(language, _)| *language)
    }

    pub fn error(&self) -> Option<&AdvisorError> {
        self.error.as_ref()
    }

    pub fn target(&self) -> Language {
        self.target
    }

    pub fn cache(&self) -> &LanguageCache<T> {
        &self.cache
    }

    pub fn phase(&self) -> Phase {
        if self.fetching {
            Phase::Fetching
        } else if self.raw.is_some() && self.pending.contains(&self.target) {
            Phase::Translating(self.target)
        } else if let Some(language) = self.displayed_language() {
            Phase::Ready(language)
        } else {
            Phase::Empty
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase(), Phase::Fetching | Phase::Translating(_))
    }

    /// Drop the canonical record, its translations and any error.
    /// Results of work started before this call will be discarded.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.raw = None;
        self.cache.clear();
        self.displayed = None;
        self.pending.clear();
        self.fetching = false;
        self.error = None;
        self.landed.send_modify(|n| *n += 1);
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.reset();
        self.fetching = true;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Record a validation error without touching the current record.
    pub fn reject(&mut self, error: AdvisorError) {
        self.error = Some(error);
    }

    /// Store a freshly fetched canonical record.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, record: T) -> FetchOutcome<T> {
        if ticket.generation != self.generation {
            debug!("Dropping superseded fetch result");
            return FetchOutcome::Stale;
        }

        let canonical = Language::canonical();
        let record = Arc::new(record);
        self.fetching = false;
        self.raw = Some(record.clone());
        self.cache.put(canonical, record.clone());

        if self.target == canonical {
            self.displayed = Some((canonical, record));
            FetchOutcome::Displayed
        } else {
            self.pending.insert(self.target);
            FetchOutcome::Translate(TranslationJob {
                generation: self.generation,
                language: self.target,
                record,
            })
        }
    }

    /// Returns false when a newer fetch already replaced this one.
    pub fn fail_fetch(&mut self, ticket: FetchTicket, error: AdvisorError) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.fetching = false;
        self.raw = None;
        self.cache.clear();
        self.displayed = None;
        self.error = Some(error);
        true
    }

    /// Make `language` the target and work out how to display it.
    /// Nothing visible changes until the returned plan is committed.
    pub fn select(&mut self, language: Language, metrics: &TranslationMetrics) -> Plan<T> {
        self.target = language;

        let Some(raw) = self.raw.clone() else {
            return Plan::Idle;
        };

        if language.is_canonical() {
            return Plan::Show(Ready {
                generation: self.generation,
                language,
                record: raw,
            });
        }

        if let Some(record) = self.cache.get(language) {
            metrics.record_cache_hit();
            return Plan::Show(Ready {
                generation: self.generation,
                language,
                record,
            });
        }

        if self.pending.contains(&language) {
            return Plan::Pending(Waiter {
                generation: self.generation,
                language,
                landed: self.landed.subscribe(),
            });
        }

        metrics.record_cache_miss();
        self.pending.insert(language);
        Plan::Translate(TranslationJob {
            generation: self.generation,
            language,
            record: raw,
        })
    }

    /// Display a ready record if it is still current.
    pub fn show(&mut self, ready: Ready<T>) -> CommitOutcome {
        if ready.generation != self.generation {
            return CommitOutcome::Stale;
        }
        if ready.language != self.target {
            return CommitOutcome::Cached;
        }
        self.displayed = Some((ready.language, ready.record));
        CommitOutcome::Displayed
    }

    /// Store a finished translation. It is displayed only if its language is
    /// still the target; fallbacks are cached like any other result.
    pub fn commit(
        &mut self,
        job: TranslationJob<T>,
        translated: T,
        metrics: &TranslationMetrics,
    ) -> CommitOutcome {
        self.land(job, translated, true, metrics)
    }

    /// Cache a finished translation without displaying it.
    pub fn store(
        &mut self,
        job: TranslationJob<T>,
        translated: T,
        metrics: &TranslationMetrics,
    ) -> CommitOutcome {
        self.land(job, translated, false, metrics)
    }

    fn land(
        &mut self,
        job: TranslationJob<T>,
        translated: T,
        display: bool,
        metrics: &TranslationMetrics,
    ) -> CommitOutcome {
        if job.generation != self.generation {
            metrics.record_stale_discard();
            debug!("Discarding {} translation of a replaced record", job.language);
            return CommitOutcome::Stale;
        }

        self.pending.remove(&job.language);
        let record = Arc::new(translated);
        self.cache.put(job.language, record.clone());
        self.landed.send_modify(|n| *n += 1);

        if display && job.language == self.target {
            self.displayed = Some((job.language, record));
            CommitOutcome::Displayed
        } else {
            CommitOutcome::Cached
        }
    }

    /// Forget a job whose caller went away before committing it, so the
    /// language can be requested again.
    pub fn abandon(&mut self, job: &TranslationJob<T>) {
        if job.generation == self.generation && self.pending.remove(&job.language) {
            debug!("Abandoned {} translation", job.language);
            self.landed.send_modify(|n| *n += 1);
        }
    }

    pub fn landing(&self, waiter: &Waiter) -> Landing<T> {
        if waiter.generation != self.generation {
            return Landing::Gone;
        }
        if self.pending.contains(&waiter.language) {
            return Landing::Running;
        }
        match self.cache.get(waiter.language) {
            Some(record) => Landing::Show(Ready {
                generation: self.generation,
                language: waiter.language,
                record,
            }),
            None => Landing::Gone,
        }
    }

    /// Display the cached record for the target if something else is shown.
    pub fn reveal(&mut self) -> bool {
        if self.fetching || self.displayed_language() == Some(self.target) {
            return false;
        }
        match self.cache.get(self.target) {
            Some(record) => {
                self.displayed = Some((self.target, record));
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> ProductSlot<T> {
    pub fn view(&self) -> ProductView<T> {
        ProductView {
            phase: self.phase(),
            loading: self.is_loading(),
            error: self.error.as_ref().map(|e| e.message().to_string()),
            data: self.displayed().cloned(),
        }
    }
}
