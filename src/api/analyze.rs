use axum::{extract::State, Json};

use super::error::ApiError;
use crate::analysis::AnalysisReport;
use crate::state::AppState;

/// POST /api/analyze - AI outlook for the battery over the rest of the day
pub async fn analyze(State(st): State<AppState>) -> Result<Json<AnalysisReport>, ApiError> {
    Ok(Json(st.analyzer.analyze().await?))
}
