//! Translation gateway: best-effort translation of every data product.
//!
//! Nothing here returns an error. A failed call (transport, malformed JSON,
//! shape mismatch) gives back the untranslated input with `fell_back` set,
//! so callers display English instead of an error banner.

use crate::catalogue::BRAND;
use crate::i18n::{Language, TranslationMetrics, TranslationValidator, UiTextSet};
use crate::llm::{GenerationService, StructuredRequest};
use crate::records::{
    ChatTranscript, ForecastRecord, MarketTrendSet, PestDiagnosis, SeedRecommendationSet,
    Translatable,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated<T> {
    pub value: T,
    /// True when `value` is the untranslated input because the call failed.
    pub fell_back: bool,
}

impl<T> Translated<T> {
    fn ok(value: T) -> Self {
        Self {
            value,
            fell_back: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            fell_back: true,
        }
    }
}

fn forecast_prompt(language: Language) -> String {
    format!(
        r#"You are a professional agricultural translator. Translate every text value of the JSON forecast below into {lang}.
Rules:
- Keep the JSON structure and every key exactly as given.
- Never change numbers.
- For month labels such as "January 2025", translate only the month name.
- "decision" starts with an emoji (✅, ❌ or ⚠️). Keep the emoji and translate only the word after it.
- Keep "{brand}" as it is.
Return only the translated JSON object."#,
        lang = language.name(),
        brand = BRAND
    )
}

fn trends_prompt(language: Language) -> String {
    format!(
        r#"You are a professional agricultural translator. Translate the market trend items below into {lang}.
Return a JSON object {{"items": [...]}} with the same number of items in the same order, each with the keys "trend" and "description".
Keep "{brand}" as it is."#,
        lang = language.name(),
        brand = BRAND
    )
}

fn pest_prompt(language: Language) -> String {
    format!(
        r#"You are a professional agricultural translator. Translate the plant diagnosis below into {lang}.
Translate "issueName", "severity", every entry of "actionSteps" and "detectedCrop".
Keep "confidenceScore" unchanged and keep the same keys and number of action steps.
Return only the translated JSON object."#,
        lang = language.name()
    )
}

fn seeds_prompt(language: Language) -> String {
    format!(
        r#"You are a professional agricultural translator. Translate the seed recommendations below into {lang}.
Keep the keys "bestMatch", "alternative" and "budget" and every field inside them.
Translate every text value, keep numbers unchanged and keep the same number of resistance traits.
Return only the translated JSON object."#,
        lang = language.name()
    )
}

fn chat_prompt(language: Language) -> String {
    format!(
        r#"You are a professional translator for a farming assistant. Translate the "text" of every message below into {lang}.
Keep "id" and "role" unchanged, keep the messages in the same order and keep "{brand}" as it is.
Return a JSON object {{"messages": [...]}}."#,
        lang = language.name(),
        brand = BRAND
    )
}

fn ui_prompt(language: Language) -> String {
    format!(
        r#"You are an expert translation service for Indian languages. Translate each string of the JSON array below into {lang}.
Return a JSON object with a single key "translations": an array of objects {{ "original": string, "translated": string }}, one per input string.
Do NOT translate the word "{brand}"."#,
        lang = language.name(),
        brand = BRAND
    )
}

/// A record the gateway knows how to prompt for.
pub trait GatewayProduct: Translatable {
    /// Whether switching to English still goes through the service.
    const TRANSLATES_TO_CANONICAL: bool = false;

    fn system_prompt(language: Language) -> String;

    /// Nothing worth translating; the input is returned without a call.
    fn is_blank(&self) -> bool {
        false
    }
}

impl GatewayProduct for ForecastRecord {
    fn system_prompt(language: Language) -> String {
        forecast_prompt(language)
    }
}

impl GatewayProduct for MarketTrendSet {
    fn system_prompt(language: Language) -> String {
        trends_prompt(language)
    }

    fn is_blank(&self) -> bool {
        self.trends.is_empty()
    }
}

impl GatewayProduct for PestDiagnosis {
    fn system_prompt(language: Language) -> String {
        pest_prompt(language)
    }
}

impl GatewayProduct for SeedRecommendationSet {
    fn system_prompt(language: Language) -> String {
        seeds_prompt(language)
    }
}

impl GatewayProduct for ChatTranscript {
    const TRANSLATES_TO_CANONICAL: bool = true;

    fn system_prompt(language: Language) -> String {
        chat_prompt(language)
    }

    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct UiTranslationResponse {
    translations: Vec<UiTranslationEntry>,
}

#[derive(Debug, Deserialize)]
struct UiTranslationEntry {
    original: String,
    translated: String,
}

#[derive(Clone)]
pub struct TranslationGateway {
    service: Arc<dyn GenerationService>,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationGateway {
    pub fn new(service: Arc<dyn GenerationService>, metrics: Arc<TranslationMetrics>) -> Self {
        Self { service, metrics }
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate any record product. Shortcuts that need no call are taken here.
    pub async fn translate<T: GatewayProduct>(&self, record: &T, language: Language) -> Translated<T> {
        if (language.is_canonical() && !T::TRANSLATES_TO_CANONICAL) || record.is_blank() {
            return Translated::ok(record.clone());
        }
        self.translate_record(record, language, T::system_prompt(language))
            .await
    }

    pub async fn translate_forecast(
        &self,
        record: &ForecastRecord,
        language: Language,
    ) -> Translated<ForecastRecord> {
        self.translate(record, language).await
    }

    pub async fn translate_trends(
        &self,
        record: &MarketTrendSet,
        language: Language,
    ) -> Translated<MarketTrendSet> {
        self.translate(record, language).await
    }

    pub async fn translate_pest(
        &self,
        record: &PestDiagnosis,
        language: Language,
    ) -> Translated<PestDiagnosis> {
        self.translate(record, language).await
    }

    pub async fn translate_seeds(
        &self,
        record: &SeedRecommendationSet,
        language: Language,
    ) -> Translated<SeedRecommendationSet> {
        self.translate(record, language).await
    }

    /// Transcripts are translated for every target, English included.
    pub async fn translate_chat(
        &self,
        transcript: &ChatTranscript,
        language: Language,
    ) -> Translated<ChatTranscript> {
        self.translate(transcript, language).await
    }

    /// Translate the given UI keys. English needs no call and yields the empty set.
    pub async fn translate_ui_texts(
        &self,
        keys: &[&str],
        language: Language,
    ) -> Translated<UiTextSet> {
        if language.is_canonical() || keys.is_empty() {
            return Translated::ok(UiTextSet::english());
        }

        self.metrics.record_gateway_call();
        match self.request_ui_texts(keys, language).await {
            Ok(set) => {
                debug!("Translated {} UI strings to {}", set.len(), language);
                Translated::ok(set)
            }
            Err(e) => {
                warn!("UI text translation to {} failed, showing English: {:#}", language, e);
                self.metrics.record_gateway_fallback();
                Translated::fallback(UiTextSet::from_pairs(language, Vec::new()))
            }
        }
    }

    async fn request_ui_texts(&self, keys: &[&str], language: Language) -> Result<UiTextSet> {
        let request = StructuredRequest::text(
            "ui translation",
            ui_prompt(language),
            serde_json::to_string(keys).context("Failed to encode UI strings")?,
        );
        let value = self.service.generate(request).await?;
        let response: UiTranslationResponse =
            serde_json::from_value(value).context("ui translation: unexpected JSON shape")?;

        let requested: HashSet<&str> = keys.iter().copied().collect();
        let pairs = response
            .translations
            .into_iter()
            .filter(|entry| requested.contains(entry.original.as_str()))
            .map(|entry| {
                let translated = if entry.original.contains(BRAND) && !entry.translated.contains(BRAND)
                {
                    entry.original.clone()
                } else {
                    entry.translated
                };
                (entry.original, translated)
            });

        Ok(UiTextSet::from_pairs(language, pairs))
    }

    async fn translate_record<T: Translatable>(
        &self,
        record: &T,
        language: Language,
        system: String,
    ) -> Translated<T> {
        self.metrics.record_gateway_call();
        match self.request_record(record, language, system).await {
            Ok(translated) => {
                self.check(record, &translated, language);
                Translated::ok(translated)
            }
            Err(e) => {
                warn!(
                    "Translation of {} to {} failed, keeping English: {:#}",
                    T::PRODUCT,
                    language,
                    e
                );
                self.metrics.record_gateway_fallback();
                Translated::fallback(record.clone())
            }
        }
    }

    async fn request_record<T: Translatable>(
        &self,
        record: &T,
        language: Language,
        system: String,
    ) -> Result<T> {
        let user = serde_json::to_string(&record.to_payload())
            .with_context(|| format!("Failed to encode {}", T::PRODUCT))?;
        let value = self
            .service
            .generate(StructuredRequest::text(T::PRODUCT, system, user))
            .await?;
        let translation: T::Translation = serde_json::from_value(value)
            .with_context(|| format!("{}: unexpected JSON shape", T::PRODUCT))?;
        let translated = record
            .overlay(translation)
            .with_context(|| format!("{}: translation does not match the {} record", T::PRODUCT, language))?;
        Ok(translated)
    }

    /// Log drift between the canonical and translated payloads.
    fn check<T: Translatable>(&self, original: &T, translated: &T, language: Language) {
        let (Ok(original), Ok(translated)) = (
            serde_json::to_string(&original.to_payload()),
            serde_json::to_string(&translated.to_payload()),
        ) else {
            return;
        };

        let report = TranslationValidator::validate(&original, &translated);
        if report.has_warnings() {
            warn!(
                "Translation validation warnings for {} in {} ({}): {:?}",
                T::PRODUCT,
                language.name(),
                language.code(),
                report.warnings
            );
        }
    }
}
