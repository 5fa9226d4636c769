//! Preview binary - runs one forecast and prints it, optionally translated
//!
//! Usage:
//!   cargo run --bin preview -- Punjab Wheat           # English only
//!   cargo run --bin preview -- Punjab Wheat Hindi     # English, then Hindi
//!
//! Required environment variables:
//! - LLM_API_KEY
//!
//! Optional:
//! - LLM_API_URL, LLM_TEXT_MODEL, LLM_MAX_TOKENS

use anyhow::{Context, Result};
use farmx_advisor::{
    advisor::Advisor,
    config::Config,
    i18n::{Language, TranslationMetrics},
    llm::ChatCompletionsClient,
    records::ForecastRecord,
    translation::TranslationGateway,
};
use std::sync::Arc;
use tracing::info;

fn print_forecast(record: &ForecastRecord) {
    println!("{}", record.title);
    println!("{}", "=".repeat(record.title.chars().count().max(20)));
    println!(
        "Decision: {}  (confidence {}%)",
        record.recommendation.decision,
        record.confidence_percent()
    );
    println!(
        "Demand: {}  Risk: {}  Price range: {}",
        record.outlook.demand.label, record.outlook.risk.label, record.outlook.price_range
    );
    println!("Plant: {}", record.recommendation.planting_window);
    println!("Sell: {}", record.recommendation.selling_window);
    println!("Markets: {}", record.recommendation.target_markets);
    println!();
    println!("{}", record.overview);
    println!();
    println!("Why: {}", record.rationale);
    println!();
    for point in record.history.iter().rev().take(6).rev() {
        println!(
            "  {:<20} ₹{:>8.0}  {}",
            point.month, point.price_per_quintal, point.market_status
        );
    }
    println!("Sources: {}", record.data_sources);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("farmx_advisor=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let region = args.first().context("Usage: preview <region> <crop> [language]")?;
    let crop = args.get(1).context("Usage: preview <region> <crop> [language]")?;
    let language = args
        .get(2)
        .map(|name| Language::from_name(name))
        .transpose()?;

    let config = Config::from_env()?;
    let service = Arc::new(ChatCompletionsClient::new(reqwest::Client::new(), &config));

    info!("Requesting forecast for {} in {}...", crop, region);
    let record = Advisor::new(service.clone())
        .forecast(region, crop)
        .await?;

    println!("\n{}", "─".repeat(60));
    print_forecast(&record);
    println!("{}\n", "─".repeat(60));

    if let Some(language) = language.filter(|l| !l.is_canonical()) {
        info!("Translating to {}...", language);
        let metrics = Arc::new(TranslationMetrics::default());
        let gateway = TranslationGateway::new(service, metrics);
        let translated = gateway.translate_forecast(&record, language).await;
        if translated.fell_back {
            println!("(translation to {} failed, showing English)\n", language);
        }
        print_forecast(&translated.value);
        println!("{}\n", "─".repeat(60));
    }

    Ok(())
}
