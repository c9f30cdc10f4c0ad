use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::simulation::SimulationError;
use crate::store::StoreError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// An upstream service failed in a way the caller should see
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

/// Error body; the dashboard reads `error`
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::Upstream(_) => "UpstreamError",
            ApiError::ServiceUnavailable(_) => "ServiceUnavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.error_type();

        let error = match &self {
            ApiError::Upstream(_) => {
                tracing::error!(error = %self, "upstream failure");
                self.to_string()
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::warn!(error = %self, "Service unavailable");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        (status, Json(ErrorResponse { error, kind })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Index(detail) => {
                tracing::error!(%detail, "telemetry index missing");
                ApiError::Upstream("Telemetry store indexing error. See server logs.".to_string())
            }
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::NoData => ApiError::NotFound(AnalysisError::NoData.to_string()),
            AnalysisError::Store(e) => e.into(),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<SimulationError> for ApiError {
    fn from(error: SimulationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CompletionError;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Upstream("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::ServiceUnavailable("test".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_analysis_errors_map_to_dashboard_messages() {
        let no_data: ApiError = AnalysisError::NoData.into();
        assert_eq!(no_data.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(no_data.to_string(), "No data found in the database.");

        let no_key: ApiError = AnalysisError::Completion(CompletionError::MissingApiKey).into();
        assert_eq!(no_key.to_string(), "OpenAI API key is not configured.");

        let index: ApiError = AnalysisError::Store(StoreError::Index("x".to_string())).into();
        assert_eq!(index.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_simulation_error_is_bad_request() {
        let err: ApiError = SimulationError::InvalidParameter {
            name: "days",
            reason: "must be positive".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_type(), "BadRequest");
    }

    #[test]
    fn test_every_failure_keeps_its_message() {
        // Upstream and service failures surface their message unchanged.
        let upstream = ApiError::Upstream("Could not get weather for AI analysis".to_string());
        assert_eq!(upstream.error_type(), "UpstreamError");
        assert_eq!(upstream.to_string(), "Could not get weather for AI analysis");

        let decode: ApiError = StoreError::Decode("bad json".to_string()).into();
        assert_eq!(decode.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(decode.to_string().contains("bad json"));
    }
}
