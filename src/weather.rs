//! Today's weather for a catalogue region (Open-Meteo daily API).
//!
//! Independent of translation: the region name is always the English key.

use crate::catalogue;
use crate::config::Config;
use crate::retry::{is_retryable_error, with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: NaiveDate,
    /// Daily maximum at 2 m, °C
    pub max_temperature_c: Option<f64>,
    /// Daily precipitation sum, mm
    pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Daily,
}

#[derive(Debug, Deserialize)]
struct Daily {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

pub struct WeatherClient {
    http: reqwest::Client,
    api_url: String,
    retry: RetryConfig,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_url: config.weather_api_url.clone(),
            retry: RetryConfig::weather(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Weather for `region` today. Regions without known coordinates give `Ok(None)`.
    pub async fn current(&self, region: &str) -> Result<Option<WeatherReport>> {
        let Some((latitude, longitude)) = catalogue::coordinates(region) else {
            debug!("No coordinates for region '{}'", region);
            return Ok(None);
        };
        let date = Local::now().date_naive();
        self.fetch(region, latitude, longitude, date).await.map(Some)
    }

    async fn fetch(
        &self,
        region: &str,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<WeatherReport> {
        let day = date.format("%Y-%m-%d").to_string();
        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("daily", "temperature_2m_max,precipitation_sum".to_string()),
            ("timezone", "auto".to_string()),
            ("start_date", day.clone()),
            ("end_date", day),
        ];

        let response: ForecastResponse = with_retry_if(
            &self.retry,
            "weather",
            || async {
                let response = self
                    .http
                    .get(&self.api_url)
                    .query(&query)
                    .send()
                    .await
                    .context("Failed to send request to weather service")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    anyhow::bail!("Weather service error ({}): {}", status, body);
                }

                response
                    .json::<ForecastResponse>()
                    .await
                    .context("Failed to parse weather response")
            },
            is_retryable_error,
        )
        .await?;

        let report = WeatherReport {
            region: region.to_string(),
            latitude,
            longitude,
            date,
            max_temperature_c: response.daily.temperature_2m_max.first().copied().flatten(),
            precipitation_mm: response.daily.precipitation_sum.first().copied().flatten(),
        };
        info!(
            "Weather for {}: max {:?} °C, rain {:?} mm",
            region, report.max_temperature_c, report.precipitation_mm
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_client(server: &MockServer) -> WeatherClient {
        let config = Config {
            llm_api_key: "unused".to_string(),
            llm_api_url: "http://localhost/unused".to_string(),
            llm_text_model: "text-model".to_string(),
            llm_vision_model: "vision-model".to_string(),
            llm_max_tokens: 4096,
            weather_api_url: format!("{}/v1/forecast", server.uri()),
            port: 8080,
            api_key: None,
        };
        WeatherClient::new(reqwest::Client::new(), &config)
            .with_retry(RetryConfig::new(2, Duration::from_millis(1)))
    }

    // ==================== Fetch Tests ====================

    #[tokio::test]
    async fn test_current_reads_first_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("daily", "temperature_2m_max,precipitation_sum"))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 31.15,
                "longitude": 75.34,
                "daily": {
                    "time": ["2026-10-18"],
                    "temperature_2m_max": [29.4],
                    "precipitation_sum": [0.0]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = create_client(&server).current("Punjab").await.unwrap().unwrap();
        assert_eq!(report.region, "Punjab");
        assert_eq!(report.max_temperature_c, Some(29.4));
        assert_eq!(report.precipitation_mm, Some(0.0));
    }

    #[tokio::test]
    async fn test_current_missing_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {"temperature_2m_max": [null]}
            })))
            .mount(&server)
            .await;

        let report = create_client(&server).current("Mysuru").await.unwrap().unwrap();
        assert_eq!(report.max_temperature_c, None);
        assert_eq!(report.precipitation_mm, None);
    }

    #[tokio::test]
    async fn test_current_unknown_region_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let report = create_client(&server).current("Atlantis").await.unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_current_server_error_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let err = create_client(&server).current("Punjab").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_current_bad_request_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad date"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(create_client(&server).current("Punjab").await.is_err());
    }
}
