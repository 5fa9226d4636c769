use anyhow::{Context, Result};
use farmx_advisor::{
    advisor::Advisor,
    api::{create_router, AppState},
    config::Config,
    i18n::TranslationMetrics,
    llm::ChatCompletionsClient,
    retry::RetryConfig,
    session::Session,
    translation::TranslationGateway,
    weather::WeatherClient,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("farmx_advisor=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Starting FarmX advisor (text model: {}, vision model: {})",
        config.llm_text_model, config.llm_vision_model
    );
    if config.api_key.is_none() {
        warn!("API_KEY not set, the API is open to anyone who can reach it");
    }

    let http = reqwest::Client::new();

    // Canonical fetches and translations retry differently
    let generation = Arc::new(ChatCompletionsClient::new(http.clone(), &config));
    let translation = Arc::new(
        ChatCompletionsClient::new(http.clone(), &config).with_retry(RetryConfig::translation()),
    );
    let gateway = TranslationGateway::new(translation, Arc::new(TranslationMetrics::default()));
    let session = Arc::new(Session::new(Advisor::new(generation), gateway));

    // Market trends are shown before the user asks for anything
    let startup = session.clone();
    tokio::spawn(async move {
        if let Err(e) = startup.refresh_trends().await {
            warn!("Initial market trends fetch failed: {}", e);
        }
    });

    let weather = Arc::new(WeatherClient::new(http, &config));
    let app = create_router(AppState::new(session, weather, config.api_key.clone()));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}
