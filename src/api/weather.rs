//! Weather endpoint

use axum::{extract::State, Json};
use tracing::warn;

use super::error::ApiError;
use crate::forecast::WeatherReport;
use crate::state::AppState;

/// GET /api/weather - latest observation and hourly forecast
pub async fn get_weather(State(st): State<AppState>) -> Result<Json<WeatherReport>, ApiError> {
    st.weather.fetch_report().await.map(Json).map_err(|e| {
        warn!(error = %e, "weather.gov request failed");
        ApiError::ServiceUnavailable("Failed to retrieve data from weather.gov".to_string())
    })
}
