//! Telemetry history and synthetic data endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::error::ApiError;
use crate::domain::KeyedHistory;
use crate::simulation::{RngNoise, SimulatorConfig, SolarTelemetrySimulator};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 366))]
    pub days: Option<u32>,
}

/// GET /api/telemetry - samples of the trailing window, keyed as stored
pub async fn get_history(
    State(st): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<KeyedHistory>, ApiError> {
    q.validate()?;
    let days = q.days.unwrap_or(st.cfg.system.history_days);
    let start_ts = Utc::now().timestamp() - i64::from(days) * 86_400;

    let history = st.store.fetch_since(start_ts).await?;
    if history.is_empty() {
        return Err(ApiError::NotFound(
            "No data found in the database.".to_string(),
        ));
    }
    Ok(Json(history))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MockRequest {
    #[validate(range(min = 1, max = 366))]
    pub days: Option<u32>,
    #[validate(range(min = 1, max = 60))]
    pub samples_per_hour: Option<u32>,
    /// Defaults to now, in the server's local offset
    pub end_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MockResponse {
    pub written: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
}

/// POST /api/telemetry/mock - generate synthetic history and store it
pub async fn generate_mock(
    State(st): State<AppState>,
    Json(req): Json<MockRequest>,
) -> Result<Json<MockResponse>, ApiError> {
    req.validate()?;

    let defaults = SimulatorConfig::from(&st.cfg.system);
    let config = SimulatorConfig {
        days: req.days.unwrap_or(defaults.days),
        samples_per_hour: req.samples_per_hour.unwrap_or(defaults.samples_per_hour),
        ..defaults
    };
    let end_time = req.end_time.unwrap_or_else(|| Local::now().fixed_offset());

    let batch = SolarTelemetrySimulator::new(config, RngNoise::from_entropy())
        .generate_keyed(end_time)?;
    let first_timestamp = batch.values().map(|s| s.timestamp).min();
    let last_timestamp = batch.values().map(|s| s.timestamp).max();

    let written = st.store.write_batch(batch).await?;
    info!(written, ?first_timestamp, ?last_timestamp, "synthetic telemetry stored");

    Ok(Json(MockResponse {
        written,
        first_timestamp,
        last_timestamp,
    }))
}
