//! JSON API consumed by the dashboard UI.

use crate::catalogue::CatalogueView;
use crate::error::{AdvisorError, AdvisorResult};
use crate::i18n::{Language, MetricsReport};
use crate::security::require_api_key;
use crate::session::{Session, SessionView};
use crate::sync::SelectionUpdate;
use crate::weather::{WeatherClient, WeatherReport};
use axum::{
    extract::State,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

pub const WEATHER_FAILED: &str = "Failed to load weather data.";

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub weather: Arc<WeatherClient>,
    /// Shared key required on every route but `/health`; None disables the check
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(session: Arc<Session>, weather: Arc<WeatherClient>, api_key: Option<String>) -> Self {
        Self {
            session,
            weather,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRequest {
    pub image_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/state", get(get_state))
        .route("/catalogue", get(get_catalogue))
        .route("/language", put(put_language))
        .route("/selection", put(put_selection))
        .route("/forecast", post(post_forecast))
        .route("/trends/refresh", post(post_trends_refresh))
        .route("/photo", put(put_photo).delete(delete_photo))
        .route("/photo/analyze", post(post_photo_analyze))
        .route("/seeds", post(post_seeds))
        .route("/chat", post(post_chat))
        .route("/weather", get(get_weather))
        .route("/metrics", get(get_metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_state(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.view())
}

async fn get_catalogue() -> Json<CatalogueView> {
    Json(CatalogueView::new())
}

async fn put_language(
    State(state): State<AppState>,
    Json(request): Json<LanguageRequest>,
) -> AdvisorResult<Json<SessionView>> {
    let language = Language::from_name(&request.language)
        .map_err(|e| AdvisorError::Validation(e.to_string()))?;
    state.session.set_language(language).await;
    Ok(Json(state.session.view()))
}

async fn put_selection(
    State(state): State<AppState>,
    Json(update): Json<SelectionUpdate>,
) -> Json<SessionView> {
    state.session.update_selection(update);
    Json(state.session.view())
}

async fn post_forecast(State(state): State<AppState>) -> AdvisorResult<Json<SessionView>> {
    state.session.submit_forecast().await?;
    Ok(Json(state.session.view()))
}

async fn post_trends_refresh(State(state): State<AppState>) -> AdvisorResult<Json<SessionView>> {
    state.session.refresh_trends().await?;
    Ok(Json(state.session.view()))
}

async fn put_photo(
    State(state): State<AppState>,
    Json(request): Json<PhotoRequest>,
) -> AdvisorResult<Json<SessionView>> {
    state.session.set_photo(&request.image_base64)?;
    Ok(Json(state.session.view()))
}

async fn delete_photo(State(state): State<AppState>) -> Json<SessionView> {
    state.session.clear_photo();
    Json(state.session.view())
}

async fn post_photo_analyze(State(state): State<AppState>) -> AdvisorResult<Json<SessionView>> {
    state.session.analyze_photo().await?;
    Ok(Json(state.session.view()))
}

async fn post_seeds(State(state): State<AppState>) -> AdvisorResult<Json<SessionView>> {
    state.session.fetch_seed_recommendations().await?;
    Ok(Json(state.session.view()))
}

async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AdvisorResult<Json<SessionView>> {
    state.session.send_chat(&request.message).await?;
    Ok(Json(state.session.view()))
}

async fn get_weather(
    State(state): State<AppState>,
) -> AdvisorResult<Json<Option<WeatherReport>>> {
    let Some(region) = state.session.weather_region() else {
        return Ok(Json(None));
    };
    let report = state.weather.current(&region).await.map_err(|e| {
        error!("Weather for {} failed: {:#}", region, e);
        AdvisorError::Fetch(WEATHER_FAILED.to_string())
    })?;
    Ok(Json(report))
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.session.metrics().report())
}
