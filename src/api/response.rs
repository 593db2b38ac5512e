//! Response types for the work-time accounting API.
//!
//! This module defines the error response structures, the mapping from
//! [`EngineError`] to HTTP status codes, and the acknowledgement returned for
//! queued recalculations.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an error for path parameters that could not be parsed.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::with_details(
            "INVALID_PATH",
            message,
            "Dates use YYYY-MM-DD; year and month are integers",
        )
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match &error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::DayPlanNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details(
                    "DAY_PLAN_NOT_FOUND",
                    message,
                    "Assign a day plan to the employee for this date",
                ),
            ),
            EngineError::EvaluationRulesNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::new("EVALUATION_RULES_NOT_FOUND", message),
            ),
            EngineError::MonthlyValueNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details(
                    "MONTHLY_VALUE_NOT_FOUND",
                    message,
                    "Calculate the month before closing or reopening it",
                ),
            ),
            EngineError::InvalidDayPlan { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("INVALID_DAY_PLAN", message),
            ),
            EngineError::InvalidEvaluationRules { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("INVALID_EVALUATION_RULES", message),
            ),
            EngineError::InvalidBooking { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("INVALID_BOOKING", message),
            ),
            EngineError::InvalidPeriod { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("INVALID_PERIOD", message),
            ),
            EngineError::MonthClosed { .. } => (
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "MONTH_CLOSED",
                    message,
                    "Reopen the month before recalculating it",
                ),
            ),
            EngineError::InvalidStateTransition { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("INVALID_STATE_TRANSITION", message),
            ),
            EngineError::StoreUnavailable { .. } | EngineError::QueueClosed => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("SERVICE_UNAVAILABLE", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

/// Acknowledgement for a queued range recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalcAccepted {
    /// The employee whose values will be recalculated.
    pub employee_id: String,
    /// First day of the range.
    pub from: NaiveDate,
    /// Last day of the range.
    pub to: NaiveDate,
    /// Number of days scheduled.
    pub days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_api_error_with_details_serialization() {
        let error = ApiError::with_details("TEST_ERROR", "Test message", "Some details");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"details\":\"Some details\""));
    }

    #[test]
    fn test_month_closed_maps_to_conflict() {
        let api_error: ApiErrorResponse = EngineError::MonthClosed {
            employee_id: "emp_001".to_string(),
            year: 2026,
            month: 3,
        }
        .into();
        assert_eq!(api_error.status, StatusCode::CONFLICT);
        assert_eq!(api_error.error.code, "MONTH_CLOSED");
        assert!(api_error.error.message.contains("2026-03"));
    }

    #[test]
    fn test_status_codes_per_error_class() {
        let status = |error: EngineError| ApiErrorResponse::from(error).status;

        assert_eq!(
            status(EngineError::DayPlanNotFound {
                employee_id: "emp_001".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(EngineError::InvalidPeriod {
                message: "month 13".to_string()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(EngineError::InvalidBooking {
                booking_id: uuid::Uuid::nil(),
                message: "edited_time 5000 outside 0..1440".to_string(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(EngineError::StoreUnavailable {
                message: "timeout".to_string()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(EngineError::ConfigNotFound {
                path: "engine.yaml".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(EngineError::InvalidStateTransition {
                message: "already closed".to_string()
            }),
            StatusCode::CONFLICT
        );
    }
}
