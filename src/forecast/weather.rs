//! Weather data from the US National Weather Service (api.weather.gov)
//!
//! The dashboard shows the latest station observation next to the hourly
//! forecast for the installation's grid point, and the analysis prompt uses
//! the same forecast.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::WeatherConfig;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid user agent: {0}")]
    UserAgent(#[from] reqwest::header::InvalidHeaderValue),

    #[error("weather response is missing `{0}`")]
    MissingField(&'static str),
}

/// Latest observation plus the next hours of forecast, passed through as
/// the upstream JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current_observation: Value,
    pub forecast: Vec<Value>,
}

/// GeoJSON feature wrapper used by every weather.gov endpoint
#[derive(Debug, Deserialize)]
struct Feature<P> {
    properties: Option<P>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    forecast_hourly: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Option<Vec<Value>>,
}

pub struct WeatherClient {
    client: Client,
    base_url: String,
    station_id: String,
    latitude: f64,
    longitude: f64,
    forecast_periods: usize,
}

impl WeatherClient {
    pub fn new(cfg: &WeatherConfig) -> Result<Self, WeatherError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));
        let client = Client::builder()
            .timeout(cfg.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            station_id: cfg.station_id.clone(),
            latitude: cfg.latitude,
            longitude: cfg.longitude,
            forecast_periods: cfg.forecast_periods,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        debug!(url, "weather.gov request");
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    /// `properties` of the station's latest observation; an empty object when
    /// the station reports none.
    pub async fn latest_observation(&self) -> Result<Value, WeatherError> {
        let url = format!(
            "{}/stations/{}/observations/latest",
            self.base_url, self.station_id
        );
        let feature: Feature<Value> = self.get_json(&url).await?;
        Ok(feature
            .properties
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    /// The first forecast periods of the grid point's hourly forecast.
    pub async fn hourly_forecast(&self) -> Result<Vec<Value>, WeatherError> {
        let points_url = format!(
            "{}/points/{},{}",
            self.base_url,
            format_coordinate(self.latitude),
            format_coordinate(self.longitude)
        );
        let point: Feature<PointProperties> = self.get_json(&points_url).await?;
        let forecast_url = point
            .properties
            .and_then(|p| p.forecast_hourly)
            .ok_or(WeatherError::MissingField("properties.forecastHourly"))?;

        let forecast: Feature<ForecastProperties> = self.get_json(&forecast_url).await?;
        let mut periods = forecast
            .properties
            .and_then(|p| p.periods)
            .ok_or(WeatherError::MissingField("properties.periods"))?;
        periods.truncate(self.forecast_periods);
        Ok(periods)
    }

    pub async fn fetch_report(&self) -> Result<WeatherReport, WeatherError> {
        let current_observation = self.latest_observation().await?;
        let forecast = self.hourly_forecast().await?;
        info!(
            station = %self.station_id,
            periods = forecast.len(),
            "weather report fetched"
        );
        Ok(WeatherReport {
            current_observation,
            forecast,
        })
    }
}

/// weather.gov redirects point lookups with more than four decimals, and
/// canonical URLs carry no trailing zeros.
fn format_coordinate(value: f64) -> String {
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
