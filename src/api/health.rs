use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    store: &'static str,
    llm_configured: bool,
}

/// GET /healthz
///
/// The service is healthy once started; `checks` reports which backends it
/// was configured with.
pub async fn health_check(State(st): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now(),
        checks: HealthChecks {
            store: st.store.backend(),
            llm_configured: st.llm.is_configured(),
        },
    };
    (StatusCode::OK, Json(response))
}
