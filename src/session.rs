//! One user's dashboard session: request orchestrators and the language switch.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Each operation reads what it needs under the lock, makes its
//! external calls unlocked, then commits under a short lock. Results that
//! lost a race are dropped by the generation checks in [`ProductSlot`].

use crate::advisor::Advisor;
use crate::catalogue::{self, CHAT_APOLOGY, GREETING};
use crate::error::{AdvisorError, AdvisorResult};
use crate::i18n::{Language, TranslationMetrics, UiTextSet};
use crate::records::{ForecastRecord, MarketTrendSet, PestDiagnosis, SeedRecommendationSet};
use crate::sync::{
    ChatCommit, ChatState, ChatView, FetchOutcome, FetchTicket, LanguageCache, Landing, Plan,
    ProductSlot, ProductView, Ready, Selection, SelectionUpdate, TranslationJob,
};
use crate::translation::{GatewayProduct, TranslationGateway};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub const MISSING_FORECAST_INPUT: &str = "Please provide both a region and a crop.";
pub const MISSING_SEED_INPUT: &str = "Please select a region and crop first.";
pub const MISSING_PHOTO: &str = "Please upload an image first.";
pub const EMPTY_MESSAGE: &str = "Please type a message first.";

struct SessionState {
    language: Language,
    ui_texts: UiTextSet,
    /// Successful UI text translations; they do not depend on any record
    ui_cache: LanguageCache<UiTextSet>,
    /// Bumped on every language switch; only the newest switch commits UI texts
    switch: u64,
    selection: Selection,
    /// Region the map and weather follow, fixed when a forecast is submitted
    active_region: Option<String>,
    forecast: ProductSlot<ForecastRecord>,
    trends: ProductSlot<MarketTrendSet>,
    photo: Option<String>,
    pest: ProductSlot<PestDiagnosis>,
    seeds: ProductSlot<SeedRecommendationSet>,
    chat: ChatState,
}

impl SessionState {
    fn new() -> Self {
        let language = Language::canonical();
        Self {
            language,
            ui_texts: UiTextSet::english(),
            ui_cache: LanguageCache::new(),
            switch: 0,
            selection: Selection::default(),
            active_region: None,
            forecast: ProductSlot::new(language),
            trends: ProductSlot::new(language),
            photo: None,
            pest: ProductSlot::new(language),
            seeds: ProductSlot::new(language),
            chat: ChatState::new(GREETING, language),
        }
    }

    /// Context and language instructions prepended to a chat message.
    fn chat_message(&self, message: &str) -> String {
        let texts = &self.ui_texts;
        let region = self.selection.query_region(texts);
        let crop = non_empty(self.selection.canonical_crop(texts));

        let mut full = String::new();
        if let (Some(region), Some(crop)) = (region, crop) {
            match self.forecast.displayed() {
                Some(forecast) => full.push_str(&format!(
                    "[Context: User is viewing a forecast for {} in {}. Recommendation: {}. Best selling time: {}.] ",
                    crop, region, forecast.recommendation.decision, forecast.recommendation.selling_window
                )),
                None => full.push_str(&format!(
                    "[Context: User has selected {} in {} but hasn't generated a full forecast yet.] ",
                    crop, region
                )),
            }
        }
        full.push_str(&format!(
            "[Instruction: The user interface is set to {lang}. Please reply in {lang} unless the user explicitly types in a different language.] ",
            lang = self.language.name()
        ));
        full.push_str(message);
        full
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Accept either bare base64 or a `data:` URL from a file reader.
fn strip_data_url(image: &str) -> &str {
    match image.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => image,
    }
}

/// A plan after its gateway call, if any, has finished.
enum Resolved<T> {
    Nothing,
    Show(Ready<T>),
    Translated(TranslationJob<T>, T),
}

/// Commit a resolved plan. A record is only put on screen next to UI texts
/// of the same language; otherwise it is cached for the switch that will
/// bring those texts.
fn apply<T>(
    slot: &mut ProductSlot<T>,
    resolved: Resolved<T>,
    ui_language: Language,
    metrics: &TranslationMetrics,
) {
    match resolved {
        Resolved::Nothing => {}
        Resolved::Show(ready) => {
            if ready.language() == ui_language {
                slot.show(ready);
            }
        }
        Resolved::Translated(job, record) => {
            if job.language == ui_language {
                slot.commit(job, record, metrics);
            } else {
                slot.store(job, record, metrics);
            }
        }
    }
}

type SlotFn<T> = fn(&mut SessionState) -> &mut ProductSlot<T>;

/// Releases a pending translation if the task running it is dropped
/// (e.g. the HTTP client disconnected) before it commits.
struct PendingGuard<'a, T> {
    session: &'a Session,
    slot: SlotFn<T>,
    job: &'a TranslationJob<T>,
    armed: bool,
}

impl<T> PendingGuard<'_, T> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.session.lock();
            (self.slot)(&mut *state).abandon(self.job);
        }
    }
}

/// Everything the UI renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub language: Language,
    pub ui_texts: UiTextSet,
    pub selection: Selection,
    pub active_region: Option<String>,
    pub forecast: ProductView<ForecastRecord>,
    pub trends: ProductView<MarketTrendSet>,
    pub pest: PestView,
    pub seeds: ProductView<SeedRecommendationSet>,
    pub chat: ChatView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PestView {
    pub has_photo: bool,
    #[serde(flatten)]
    pub diagnosis: ProductView<PestDiagnosis>,
}

pub struct Session {
    state: Mutex<SessionState>,
    advisor: Advisor,
    gateway: TranslationGateway,
}

impl Session {
    pub fn new(advisor: Advisor, gateway: TranslationGateway) -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
            advisor,
            gateway,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        self.gateway.metrics()
    }

    pub fn language(&self) -> Language {
        self.lock().language
    }

    pub fn view(&self) -> SessionView {
        let state = self.lock();
        SessionView {
            language: state.language,
            ui_texts: state.ui_texts.clone(),
            selection: state.selection.clone(),
            active_region: state.active_region.clone(),
            forecast: state.forecast.view(),
            trends: state.trends.view(),
            pest: PestView {
                has_photo: state.photo.is_some(),
                diagnosis: state.pest.view(),
            },
            seeds: state.seeds.view(),
            chat: state.chat.view(),
        }
    }

    /// Region the weather panel should show.
    pub fn weather_region(&self) -> Option<String> {
        let state = self.lock();
        state
            .active_region
            .clone()
            .or_else(|| state.selection.active_region(&state.ui_texts))
    }

    pub fn update_selection(&self, update: SelectionUpdate) {
        let mut state = self.lock();
        let state = &mut *state;
        state.selection.update(update, &state.ui_texts);
    }

    // ==================== Orchestrators ====================

    /// Store a canonical fetch result; translate it first when the display
    /// language is not English.
    async fn settle<T: GatewayProduct>(
        &self,
        slot: SlotFn<T>,
        ticket: FetchTicket,
        result: AdvisorResult<T>,
    ) -> AdvisorResult<()> {
        let job = {
            let mut state = self.lock();
            let slot = slot(&mut *state);
            match result {
                Err(err) => {
                    slot.fail_fetch(ticket, err.clone());
                    return Err(err);
                }
                Ok(record) => match slot.complete_fetch(ticket, record) {
                    FetchOutcome::Stale | FetchOutcome::Displayed => return Ok(()),
                    FetchOutcome::Translate(job) => job,
                },
            }
        };

        self.metrics().record_cache_miss();
        let translated = self.run_job(slot, &job).await;
        let mut state = self.lock();
        let state = &mut *state;
        let ui_language = state.ui_texts.language();
        apply(
            slot(state),
            Resolved::Translated(job, translated),
            ui_language,
            self.metrics(),
        );
        Ok(())
    }

    async fn run_job<T: GatewayProduct>(&self, slot: SlotFn<T>, job: &TranslationJob<T>) -> T {
        let guard = PendingGuard {
            session: self,
            slot,
            job,
            armed: true,
        };
        let translated = self.gateway.translate(&*job.record, job.language).await;
        guard.disarm();
        translated.value
    }

    pub async fn submit_forecast(&self) -> AdvisorResult<()> {
        let (ticket, region, crop) = {
            let mut state = self.lock();
            let state = &mut *state;
            let texts = &state.ui_texts;
            let region = state.selection.query_region(texts);
            let crop = non_empty(state.selection.canonical_crop(texts));
            let (Some(region), Some(crop)) = (region, crop) else {
                let err = AdvisorError::Validation(MISSING_FORECAST_INPUT.to_string());
                state.forecast.reject(err.clone());
                return Err(err);
            };

            state.seeds.reset();
            state.active_region = state.selection.active_region(texts);
            (state.forecast.begin_fetch(), region, crop)
        };

        info!("Requesting forecast for {} in {}", crop, region);
        let result = self.advisor.forecast(&region, &crop).await;
        self.settle(|s| &mut s.forecast, ticket, result).await
    }

    pub async fn refresh_trends(&self) -> AdvisorResult<()> {
        let ticket = self.lock().trends.begin_fetch();
        let result = self.advisor.market_trends().await;
        self.settle(|s| &mut s.trends, ticket, result).await
    }

    /// Replace the photo; the previous diagnosis no longer applies.
    pub fn set_photo(&self, image_base64: &str) -> AdvisorResult<()> {
        let image = strip_data_url(image_base64.trim());
        let mut state = self.lock();
        if image.is_empty() {
            let err = AdvisorError::Validation(MISSING_PHOTO.to_string());
            state.pest.reject(err.clone());
            return Err(err);
        }
        state.pest.reset();
        state.photo = Some(image.to_string());
        debug!("Photo set ({} base64 bytes)", image.len());
        Ok(())
    }

    pub fn clear_photo(&self) {
        let mut state = self.lock();
        state.pest.reset();
        state.photo = None;
    }

    pub async fn analyze_photo(&self) -> AdvisorResult<()> {
        let (ticket, photo, crop_hint) = {
            let mut state = self.lock();
            let state = &mut *state;
            let Some(photo) = state.photo.clone() else {
                let err = AdvisorError::Validation(MISSING_PHOTO.to_string());
                state.pest.reject(err.clone());
                return Err(err);
            };
            let crop_hint = non_empty(state.selection.canonical_crop(&state.ui_texts));
            (state.pest.begin_fetch(), photo, crop_hint)
        };

        info!("Analyzing crop photo (hint: {:?})", crop_hint);
        let result = self
            .advisor
            .analyze_crop_health(&photo, crop_hint.as_deref())
            .await;
        self.settle(|s| &mut s.pest, ticket, result).await
    }

    pub async fn fetch_seed_recommendations(&self) -> AdvisorResult<()> {
        let (ticket, region, crop, soil) = {
            let mut state = self.lock();
            let state = &mut *state;
            let texts = &state.ui_texts;
            let region = state.selection.query_region(texts);
            let crop = non_empty(state.selection.canonical_crop(texts));
            let (Some(region), Some(crop)) = (region, crop) else {
                let err = AdvisorError::Validation(MISSING_SEED_INPUT.to_string());
                state.seeds.reject(err.clone());
                return Err(err);
            };
            let soil = state.selection.canonical_soil(texts);
            (state.seeds.begin_fetch(), region, crop, soil)
        };

        info!("Requesting seed varieties for {} in {}", crop, region);
        let result = self
            .advisor
            .seed_recommendations(&region, &crop, &soil)
            .await;
        self.settle(|s| &mut s.seeds, ticket, result).await
    }

    /// Send a chat message. On failure the transcript gets an apology in the
    /// display language and the error is returned.
    pub async fn send_chat(&self, message: &str) -> AdvisorResult<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AdvisorError::Validation(EMPTY_MESSAGE.to_string()));
        }

        let (full, history) = {
            let mut state = self.lock();
            let full = state.chat_message(message);
            state.chat.push_user(message);
            (full, state.chat.history().to_vec())
        };

        let result = self.advisor.chat_reply(&history, &full).await;

        let mut state = self.lock();
        match result {
            Ok(reply) => {
                state.chat.push_reply(full, reply);
                Ok(())
            }
            Err(err) => {
                let apology = state.ui_texts.t(CHAT_APOLOGY).to_string();
                state.chat.push_failure(&apology);
                Err(err)
            }
        }
    }

    // ==================== Language Switch ====================

    async fn resolve<T: GatewayProduct>(&self, slot: SlotFn<T>, plan: Plan<T>) -> Resolved<T> {
        match plan {
            Plan::Idle => Resolved::Nothing,
            Plan::Show(ready) => Resolved::Show(ready),
            Plan::Translate(job) => {
                let translated = self.run_job(slot, &job).await;
                Resolved::Translated(job, translated)
            }
            Plan::Pending(mut waiter) => loop {
                let landing = {
                    let mut state = self.lock();
                    slot(&mut *state).landing(&waiter)
                };
                match landing {
                    Landing::Running => {}
                    Landing::Show(ready) => return Resolved::Show(ready),
                    Landing::Gone => return Resolved::Nothing,
                }
                debug!("Waiting for the running {} translation", waiter.language());
                if !waiter.changed().await {
                    return Resolved::Nothing;
                }
            },
        }
    }

    /// UI texts for `language`, from the cache when this language was seen before.
    async fn ui_texts_for(&self, language: Language, cached: Option<Arc<UiTextSet>>) -> UiTextSet {
        if let Some(texts) = cached {
            return texts.as_ref().clone();
        }
        let ui = self
            .gateway
            .translate_ui_texts(catalogue::ui_texts(), language)
            .await;
        if ui.fell_back {
            warn!("UI texts for {} unavailable, showing English labels", language);
        } else if !language.is_canonical() {
            let mut state = self.lock();
            state.ui_cache.put(language, Arc::new(ui.value.clone()));
        }
        ui.value
    }

    /// Switch the display language.
    ///
    /// UI texts, forecast and trends are resolved concurrently and committed
    /// together, so no frame mixes languages across them. A product whose
    /// translation to this language is already running is waited for. The
    /// photo diagnosis, seed recommendations and chat follow once the new UI
    /// texts are in.
    pub async fn set_language(&self, language: Language) {
        let (switch, cached_ui, forecast_plan, trends_plan) = {
            let mut state = self.lock();
            let state = &mut *state;
            if state.language == language {
                return;
            }
            info!("Switching display language {} -> {}", state.language, language);
            state.language = language;
            state.switch += 1;
            let metrics = self.gateway.metrics();

            let cached_ui = if language.is_canonical() {
                None
            } else {
                let hit = state.ui_cache.get(language);
                match hit {
                    Some(_) => metrics.record_cache_hit(),
                    None => metrics.record_cache_miss(),
                }
                hit
            };
            (
                state.switch,
                cached_ui,
                state.forecast.select(language, metrics),
                state.trends.select(language, metrics),
            )
        };

        let (ui, forecast, trends) = futures::join!(
            self.ui_texts_for(language, cached_ui),
            self.resolve(|s| &mut s.forecast, forecast_plan),
            self.resolve(|s| &mut s.trends, trends_plan),
        );

        let (pest_plan, seeds_plan, chat_job) = {
            let mut state = self.lock();
            let state = &mut *state;
            let metrics = self.gateway.metrics();

            let current = state.switch == switch;
            if current {
                let previous = std::mem::replace(&mut state.ui_texts, ui);
                state.selection.remap(&previous, &state.ui_texts);
            }
            let ui_language = state.ui_texts.language();
            apply(&mut state.forecast, forecast, ui_language, metrics);
            apply(&mut state.trends, trends, ui_language, metrics);

            if !current {
                debug!("Language switch to {} superseded", language);
                return;
            }
            // Picks up records a fetch translated while the old labels were up
            state.forecast.reveal();
            state.trends.reveal();

            let chat_job = state.chat.begin_translation(language);
            if chat_job.is_none() {
                let greeting = state.ui_texts.t(GREETING).to_string();
                state.chat.substitute_greeting(&greeting);
            }
            (
                state.pest.select(language, metrics),
                state.seeds.select(language, metrics),
                chat_job,
            )
        };

        let chat = async {
            let mut next = chat_job;
            while let Some(job) = next {
                let translated = self.gateway.translate_chat(&job.transcript, job.language).await;
                next = {
                    let mut state = self.lock();
                    match state.chat.commit_translation(job, translated.value) {
                        ChatCommit::Retry(job) => {
                            debug!("Chat changed during translation, translating again");
                            Some(job)
                        }
                        ChatCommit::Applied | ChatCommit::Dropped => None,
                    }
                };
            }
        };
        let (pest, seeds, ()) = futures::join!(
            self.resolve(|s| &mut s.pest, pest_plan),
            self.resolve(|s| &mut s.seeds, seeds_plan),
            chat,
        );

        let mut state = self.lock();
        let state = &mut *state;
        let ui_language = state.ui_texts.language();
        let metrics = self.gateway.metrics();
        apply(&mut state.pest, pest, ui_language, metrics);
        apply(&mut state.seeds, seeds, ui_language, metrics);
    }
}
