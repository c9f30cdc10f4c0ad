//! AI analysis of recent telemetry against the weather forecast
//!
//! The analyzer pulls the trailing history from the telemetry store, the
//! hourly forecast from weather.gov, and asks a chat-completion model for a
//! short outlook plus numeric predictions returned as JSON.

pub mod llm;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{sorted_by_timestamp, KeyedHistory, SystemParams, TelemetrySample};
use crate::forecast::{WeatherClient, WeatherError};
use crate::store::{StoreError, TelemetryStore};

pub use llm::{ChatMessage, CompletionClient, CompletionError};

pub const SYSTEM_PROMPT: &str = "You are a solar energy analytic engine. Output only valid JSON.";

/// Every n-th sample of the history goes into the prompt
const SAMPLE_STRIDE: usize = 4;
/// Most recent strided samples kept in the prompt
const PROMPT_HISTORY_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// State of charge expected at midnight, percent
    pub final_soc: f64,
    /// Solar energy harvested today, Wh
    pub total_wh: f64,
    /// Harvest minus load consumption by midnight, Wh (negative is a loss)
    pub net_wh_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report: String,
    pub prediction: Prediction,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No data found in the database.")]
    NoData,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not get weather for AI analysis")]
    Weather(#[source] WeatherError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("completion is not a valid analysis report: {0}")]
    Parse(String),
}

/// Newest sample's state of charge.
pub fn current_soc(history: &KeyedHistory) -> Option<f64> {
    history
        .values()
        .max_by_key(|s| s.timestamp)
        .map(|s| s.battery_soc_perc)
}

/// Thin the history for the prompt: oldest first, every fourth sample, the
/// last 24 of those.
pub fn sample_history(history: &KeyedHistory) -> Vec<TelemetrySample> {
    let strided: Vec<TelemetrySample> = sorted_by_timestamp(history)
        .into_iter()
        .step_by(SAMPLE_STRIDE)
        .collect();
    let skip = strided.len().saturating_sub(PROMPT_HISTORY_LEN);
    strided.into_iter().skip(skip).collect()
}

pub fn build_prompt(
    params: &SystemParams,
    current_soc: f64,
    forecast: &[Value],
    sampled: &[TelemetrySample],
) -> String {
    format!(
        r#"You are a solar energy analyst for a system with a {capacity:.1}Wh Sealed Lead Acid Battery and a {load}W constant load.
Analyze the following data:
- Current Battery SOC: {current_soc}%
- Weather Forecast (Next {periods}h): {forecast}
- Recent Performance (Sampled Telemetry): {history}

Perform these tasks and respond ONLY with a valid JSON object:
1. Write a forward-looking analysis (2-3 sentences) based on the weather forecast. Mention expected solar production (e.g. 'good', 'poor due to clouds') and its impact on the battery.
2. Predict the final SOC (%) at midnight tonight.
3. Predict the total solar energy harvested today in Watt-hours (Wh).
4. Predict the net energy gain for the battery in Watt-hours (Wh) by midnight. This is (Total Energy Harvested - Total Energy Consumed by the load). A negative value indicates a net loss.

Output JSON format:
{{
    "report": "Your analysis string here...",
    "prediction": {{
        "final_soc": <float>,
        "total_wh": <float>,
        "net_wh_gain": <float>
    }}
}}"#,
        capacity = params.battery_capacity_wh,
        load = params.baseline_load_w,
        periods = forecast.len(),
        forecast = json!(forecast),
        history = json!(sampled),
    )
}

/// Parse the model's reply, tolerating a Markdown code fence around it.
pub fn parse_report(content: &str) -> Result<AnalysisReport, AnalysisError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim()).map_err(|e| AnalysisError::Parse(e.to_string()))
}

pub struct Analyzer {
    store: Arc<dyn TelemetryStore>,
    weather: Arc<WeatherClient>,
    llm: Arc<CompletionClient>,
    params: SystemParams,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        weather: Arc<WeatherClient>,
        llm: Arc<CompletionClient>,
        params: SystemParams,
    ) -> Self {
        Self {
            store,
            weather,
            llm,
            params,
        }
    }

    pub async fn analyze(&self) -> Result<AnalysisReport, AnalysisError> {
        let start_ts = Utc::now().timestamp() - i64::from(self.params.history_days) * 86_400;
        let history = self.store.fetch_since(start_ts).await?;
        let soc = current_soc(&history).ok_or(AnalysisError::NoData)?;

        let forecast = self.weather.hourly_forecast().await.map_err(|e| {
            warn!(error = %e, "weather fetch for analysis failed");
            AnalysisError::Weather(e)
        })?;

        let sampled = sample_history(&history);
        let prompt = build_prompt(&self.params, soc, &forecast, &sampled);
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let content = self.llm.complete(&messages).await?;
        let report = parse_report(&content)?;
        info!(
            samples = history.len(),
            current_soc = soc,
            final_soc = report.prediction.final_soc,
            "analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: i64, soc: f64) -> TelemetrySample {
        TelemetrySample {
            timestamp,
            sunlight_lux: 0,
            panel_temp_c: 20.0,
            dc_voltage_v: 0.0,
            dc_current_ma: 0,
            dc_power_w: 0.0,
            battery_soc_perc: soc,
        }
    }

    fn history(n: i64) -> KeyedHistory {
        // Keys deliberately sort differently from timestamps.
        (0..n)
            .map(|i| (format!("k{:03}", n - i), sample(i * 3600, i as f64)))
            .collect()
    }

    #[test]
    fn test_current_soc_uses_newest_sample() {
        assert_eq!(current_soc(&history(10)), Some(9.0));
        assert_eq!(current_soc(&KeyedHistory::new()), None);
    }

    #[test]
    fn test_sample_history_strides_and_keeps_tail() {
        let sampled = sample_history(&history(168));
        // 168 / 4 = 42 strided samples, last 24 kept.
        assert_eq!(sampled.len(), 24);
        assert_eq!(sampled[0].timestamp, 18 * 4 * 3600);
        assert_eq!(sampled[23].timestamp, 41 * 4 * 3600);
        for pair in sampled.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, 4 * 3600);
        }
    }

    #[test]
    fn test_sample_history_short() {
        let sampled = sample_history(&history(10));
        let ts: Vec<i64> = sampled.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![0, 4 * 3600, 8 * 3600]);
    }

    #[test]
    fn test_prompt_mentions_system_and_data() {
        let params = SystemParams::default();
        let forecast = vec![json!({"shortForecast": "Mostly Sunny"})];
        let prompt = build_prompt(&params, 63.5, &forecast, &[sample(0, 63.5)]);

        assert!(prompt.contains("96.0Wh Sealed Lead Acid Battery"));
        assert!(prompt.contains("2.5W constant load"));
        assert!(prompt.contains("Current Battery SOC: 63.5%"));
        assert!(prompt.contains("Mostly Sunny"));
        assert!(prompt.contains("\"battery_soc_perc\":63.5"));
        assert!(prompt.contains("\"net_wh_gain\": <float>"));
    }

    #[test]
    fn test_parse_plain_report() {
        let content = r#"{"report": "Clear skies.", "prediction": {"final_soc": 71.2, "total_wh": 88.0, "net_wh_gain": 28.0}}"#;
        let report = parse_report(content).unwrap();
        assert_eq!(report.report, "Clear skies.");
        assert_eq!(report.prediction.final_soc, 71.2);
    }

    #[test]
    fn test_parse_fenced_report() {
        let content = "```json\n{\"report\": \"Rain.\", \"prediction\": {\"final_soc\": 40, \"total_wh\": 12.5, \"net_wh_gain\": -47.5}}\n```";
        let report = parse_report(content).unwrap();
        assert_eq!(report.prediction.net_wh_gain, -47.5);
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(matches!(
            parse_report("The battery looks fine."),
            Err(AnalysisError::Parse(_))
        ));
    }
}
