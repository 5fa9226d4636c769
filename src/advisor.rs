//! Canonical (English) fetches: one call per data product.
//!
//! Every failure here is user-visible and comes back as
//! [`AdvisorError::Fetch`] with a displayable message; details go to the log.

use crate::error::{AdvisorError, AdvisorResult};
use crate::llm::{ChatTurn, GenerationService, StructuredRequest};
use crate::records::{
    ForecastPayload, ForecastRecord, MarketTrendSet, PestDiagnosis, PestPayload,
    SeedRecommendationSet, Source, TrendItem, HISTORY_MONTHS,
};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const FORECAST_FAILED: &str = "Failed to get forecast from AI. Please try again.";
pub const TRENDS_FAILED: &str = "Failed to get market trends from AI.";
pub const PEST_FAILED: &str = "Failed to analyze image. Please try again.";
pub const SEEDS_FAILED: &str = "Failed to get seed recommendations.";
pub const CHAT_FAILED: &str = "Failed to get a response from the AI assistant.";
pub const EMPTY_REPLY: &str = "Sorry, I could not generate a response.";

/// Soil description used when the user did not pick one.
pub const DEFAULT_SOIL: &str = "General for this region";

/// Number of headlines requested per refresh.
pub const TREND_COUNT: usize = 5;

pub const CHAT_SYSTEM_PROMPT: &str = r#"You are FarmX Assistant, a friendly and practical agricultural advisor for Indian farmers.

**What the FarmX platform offers:**
1. **Market Forecast**: 6-month price and demand forecasts for a crop in a region.
2. **Market Trends**: the latest agricultural news headlines.
3. **Climate Map**: terrain, climate and today's weather for the selected region.
4. **Crop Doctor**: photo-based pest and disease detection.
5. **Seed Recommender**: the best seed varieties for a crop, region and soil type.
6. **Translation**: the app works in several Indian languages.

**How to answer:**
- Keep answers short and direct.
- Use bullet points for steps, tips and reasons.
- Use simple words; avoid jargon.
- Give actionable advice.
- You understand English, Hindi, Tamil, Telugu, Kannada, Bengali, Marathi and Gujarati. Reply in the language the user writes in.
- Keep the Indian context: mandis, MSP, kharif and rabi seasons, schemes such as PM-KISAN.

Topics you cover: crop care (soil preparation, NPK fertilisers, irrigation, pest control, disease symptoms), market advice (selling windows, target mandis, demand and supply), help with FarmX features, and general farming (seasons, climate, government schemes).

If a question has nothing to do with farming, agriculture, weather, markets or FarmX, politely say you only help with farming topics."#;

fn forecast_system_prompt() -> String {
    format!(
        r#"You are FarmX, an AI agricultural advisor for the Indian marketplace.
Respond with ONE valid JSON object that matches this schema exactly (no extra keys, no markdown):
{{
  "analysisTitle": string,
  "historicalData": [ {{ "monthYear": string, "pricePerQuintal": number, "marketStatus": string }} ],
  "forecast": {{ "expectedDemand": "High"|"Medium"|"Low", "priceRange": string, "riskLevel": "High"|"Medium"|"Low" }},
  "recommendation": {{ "decision": "✅ GROW"|"❌ AVOID"|"⚠️ CAUTION", "bestPlantingTime": string, "bestSellingTime": string, "targetMarkets": string }},
  "whyRecommendation": string,
  "overviewSummary": string,
  "farmxConfidence": number,
  "dataSources": string
}}
Rules:
- historicalData has exactly {months} entries covering the last {months} months, oldest first, with full month names such as "January 2025".
- recommendation.decision is exactly one of "✅ GROW", "❌ AVOID", "⚠️ CAUTION".
- A crop that is climatically unsuitable for the region (for example Apple in Bangalore) must get "❌ AVOID", explained in whyRecommendation.
- farmxConfidence is a fraction between 0.0 and 1.0.
- Every field is in English."#,
        months = HISTORY_MONTHS
    )
}

fn trends_system_prompt(month: &str) -> String {
    format!(
        r#"You are FarmX, an agricultural market analyst who knows the Indian agricultural market in depth.
Respond with a JSON object with a key "trends": an array of exactly {count} objects, each with
- "trend": a short, catchy headline (10 words at most)
- "description": a one or two sentence summary
Optionally add a key "sources": an array of {{ "title": string, "uri": string }} you relied on.

Write {count} realistic Indian agricultural market trends for {month}. Suitable topics: MSP announcements, export and import policy, crop price movements, government schemes, seasonal demand shifts, mandi arrivals."#,
        count = TREND_COUNT,
        month = month
    )
}

fn pest_system_prompt(crop_hint: Option<&str>) -> String {
    let hint = crop_hint
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("The user says this may be a '{}' plant.\n", c))
        .unwrap_or_default();
    format!(
        r#"You are an expert plant pathologist and agronomist.
Examine the plant in the image for pests, diseases or nutrient deficiencies.
{hint}Return a JSON object with exactly these keys:
{{
  "issueName": string,
  "confidenceScore": number (0.0 to 1.0),
  "severity": "Low"|"Medium"|"High",
  "actionSteps": [string],
  "detectedCrop": string
}}
- With no clear issue: issueName is "No clear issue detected", severity is "Low", and actionSteps are general care tips.
- If the image does not show a plant: issueName is "Invalid Image".
- All text in English."#,
        hint = hint
    )
}

const SEEDS_SYSTEM_PROMPT: &str = r#"You are an expert agronomist and seed specialist for Indian agriculture.
Respond with a JSON object with exactly this structure:
{
  "bestMatch": { "varietyName": string, "suitabilityReason": string, "yieldRange": string, "resistanceTraits": [string], "maturityDuration": string, "costRange": string, "performanceTip": string },
  "alternative": { same fields },
  "budget": { same fields }
}
Pick 3 specific, real seed varieties (hybrid or open-pollinated) that are widely sold in India and suit the given conditions.
All output in English."#;

/// Issues the canonical fetch for each data product.
#[derive(Clone)]
pub struct Advisor {
    service: Arc<dyn GenerationService>,
}

impl Advisor {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: StructuredRequest) -> Result<T> {
        let name = request.name;
        let value = self.service.generate(request).await?;
        serde_json::from_value(value).with_context(|| format!("{}: unexpected JSON shape", name))
    }

    /// 24-month price history, 6-month outlook and a grow/avoid decision.
    pub async fn forecast(&self, region: &str, crop: &str) -> AdvisorResult<ForecastRecord> {
        let request = StructuredRequest::text(
            "forecast",
            forecast_system_prompt(),
            format!(
                "Generate a detailed agricultural forecast for:\nRegion: {}\nCrop: {}",
                region, crop
            ),
        );

        let result = async {
            let payload: ForecastPayload = self.fetch(request).await?;
            ForecastRecord::try_from(payload)
        }
        .await;

        result
            .map(|record| {
                info!(
                    "Forecast ready for {} in {}: {}",
                    crop, region, record.recommendation.decision
                );
                record
            })
            .map_err(|e| {
                error!("Forecast for {} in {} failed: {:#}", crop, region, e);
                AdvisorError::Fetch(FORECAST_FAILED.to_string())
            })
    }

    pub async fn market_trends(&self) -> AdvisorResult<MarketTrendSet> {
        let month = Utc::now().format("%B %Y").to_string();
        let request = StructuredRequest::text(
            "market trends",
            trends_system_prompt(&month),
            format!(
                "Generate the latest {} Indian agricultural market trends for today.",
                TREND_COUNT
            ),
        );

        match self.service.generate(request).await {
            Ok(value) => {
                let set = parse_trends(&value);
                info!(
                    "Fetched {} market trends ({} sources)",
                    set.trends.len(),
                    set.sources.len()
                );
                Ok(set)
            }
            Err(e) => {
                error!("Market trends fetch failed: {:#}", e);
                Err(AdvisorError::Fetch(TRENDS_FAILED.to_string()))
            }
        }
    }

    pub async fn analyze_crop_health(
        &self,
        image_base64: &str,
        crop_hint: Option<&str>,
    ) -> AdvisorResult<PestDiagnosis> {
        let request = StructuredRequest::vision(
            "crop health",
            pest_system_prompt(crop_hint),
            "Analyze this plant image and return the JSON result.",
            image_base64,
        );

        let result = async {
            let payload: PestPayload = self.fetch(request).await?;
            PestDiagnosis::try_from(payload)
        }
        .await;

        result.map_err(|e| {
            error!("Crop health analysis failed: {:#}", e);
            AdvisorError::Fetch(PEST_FAILED.to_string())
        })
    }

    /// `soil` may be empty; the service is then asked for general advice.
    pub async fn seed_recommendations(
        &self,
        region: &str,
        crop: &str,
        soil: &str,
    ) -> AdvisorResult<SeedRecommendationSet> {
        let soil = if soil.trim().is_empty() {
            DEFAULT_SOIL
        } else {
            soil
        };
        let request = StructuredRequest::text(
            "seed recommendations",
            SEEDS_SYSTEM_PROMPT,
            format!(
                "Recommend seed varieties for:\nRegion: {}\nCrop: {}\nSoil Type: {}\n\n\
                 Rank them as:\n\
                 1. bestMatch: best overall performance\n\
                 2. alternative: a good backup or a specific trait focus\n\
                 3. budget: cost-effective but reliable",
                region, crop, soil
            ),
        );

        self.fetch(request).await.map_err(|e| {
            error!("Seed recommendations for {} in {} failed: {:#}", crop, region, e);
            AdvisorError::Fetch(SEEDS_FAILED.to_string())
        })
    }

    /// Assistant reply to `message` given the earlier turns.
    pub async fn chat_reply(&self, history: &[ChatTurn], message: &str) -> AdvisorResult<String> {
        match self.service.reply(CHAT_SYSTEM_PROMPT, history, message).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("Chat reply was empty");
                Ok(EMPTY_REPLY.to_string())
            }
            Ok(text) => Ok(text),
            Err(e) => {
                error!("Chat reply failed: {:#}", e);
                Err(AdvisorError::Fetch(CHAT_FAILED.to_string()))
            }
        }
    }
}

/// Read `{"trends": [...], "sources": [...]}` leniently: a missing or
/// non-array `trends` is an empty list and malformed entries are skipped.
fn parse_trends(value: &Value) -> MarketTrendSet {
    fn entries<T: DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    let trends: Vec<TrendItem> = entries(value, "trends");
    if value.get("trends").map_or(true, |t| !t.is_array()) {
        warn!("Market trends response had no trends array");
    }
    let sources: Vec<Source> = entries(value, "sources");
    MarketTrendSet::new(trends, sources)
}
