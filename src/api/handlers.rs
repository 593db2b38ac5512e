//! HTTP request handlers for the work-time accounting API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;

use super::request::{ActorRequest, RecalcRequest};
use super::response::{ApiError, ApiErrorResponse, RecalcAccepted};
use super::state::AppState;

type MonthPath = Result<Path<(String, i32, u32)>, PathRejection>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/employees/:employee_id/days/:date/calculate",
            post(calculate_day_handler),
        )
        .route(
            "/employees/:employee_id/months/:year/:month/calculate",
            post(calculate_month_handler),
        )
        .route(
            "/employees/:employee_id/months/:year/:month/close",
            post(close_month_handler),
        )
        .route(
            "/employees/:employee_id/months/:year/:month/reopen",
            post(reopen_month_handler),
        )
        .route("/employees/:employee_id/recalc", post(recalc_handler))
        .with_state(state)
}

/// Handler for POST /employees/:employee_id/days/:date/calculate.
///
/// Calculates the day synchronously and returns the full result including
/// the audit trace.
async fn calculate_day_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, NaiveDate)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let (employee_id, date) = match path {
        Ok(Path(params)) => params,
        Err(rejection) => return path_error(correlation_id, rejection),
    };
    info!(correlation_id = %correlation_id, %employee_id, %date, "Processing day calculation");

    match state.service().calculate_day(&employee_id, date) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                %employee_id,
                %date,
                net_time = result.value.net_time,
                has_error = result.value.has_error,
                duration_us = result.audit_trace.duration_us,
                "Day calculation completed"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /employees/:employee_id/months/:year/:month/calculate.
async fn calculate_month_handler(State(state): State<AppState>, path: MonthPath) -> Response {
    let correlation_id = Uuid::new_v4();
    let (employee_id, year, month) = match path {
        Ok(Path(params)) => params,
        Err(rejection) => return path_error(correlation_id, rejection),
    };
    info!(correlation_id = %correlation_id, %employee_id, year, month, "Processing month calculation");

    match state.service().calculate_month(&employee_id, year, month) {
        Ok(value) => {
            info!(
                correlation_id = %correlation_id,
                %employee_id,
                flextime_end = value.flextime_end,
                "Month calculation completed"
            );
            json_response(StatusCode::OK, value)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

#[derive(Debug, Clone, Copy)]
enum MonthTransition {
    Close,
    Reopen,
}

/// Handler for POST /employees/:employee_id/months/:year/:month/close.
async fn close_month_handler(
    State(state): State<AppState>,
    path: MonthPath,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> Response {
    month_transition(&state, path, payload, MonthTransition::Close)
}

/// Handler for POST /employees/:employee_id/months/:year/:month/reopen.
async fn reopen_month_handler(
    State(state): State<AppState>,
    path: MonthPath,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> Response {
    month_transition(&state, path, payload, MonthTransition::Reopen)
}

fn month_transition(
    state: &AppState,
    path: MonthPath,
    payload: Result<Json<ActorRequest>, JsonRejection>,
    transition: MonthTransition,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let (employee_id, year, month) = match path {
        Ok(Path(params)) => params,
        Err(rejection) => return path_error(correlation_id, rejection),
    };
    let actor = match payload {
        Ok(Json(request)) => request.actor,
        Err(rejection) => return body_error(correlation_id, rejection),
    };
    if actor.trim().is_empty() {
        warn!(correlation_id = %correlation_id, "Empty actor");
        return json_response(
            StatusCode::BAD_REQUEST,
            ApiError::validation_error("actor must not be empty"),
        );
    }
    info!(
        correlation_id = %correlation_id,
        %employee_id,
        year,
        month,
        %actor,
        ?transition,
        "Processing month transition"
    );

    let service = state.service();
    let result = match transition {
        MonthTransition::Close => service.close_month(&employee_id, year, month, &actor),
        MonthTransition::Reopen => service.reopen_month(&employee_id, year, month, &actor),
    };
    match result {
        Ok(value) => json_response(StatusCode::OK, value),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /employees/:employee_id/recalc.
///
/// Queues the range and returns 202 without waiting for the calculations.
async fn recalc_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<RecalcRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let employee_id = match path {
        Ok(Path(employee_id)) => employee_id,
        Err(rejection) => return path_error(correlation_id, rejection),
    };
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return body_error(correlation_id, rejection),
    };

    match state
        .queue()
        .trigger_recalc_range(&employee_id, request.from, request.to)
        .await
    {
        Ok(()) => {
            let days = (request.to - request.from).num_days() + 1;
            info!(
                correlation_id = %correlation_id,
                %employee_id,
                from = %request.from,
                to = %request.to,
                days,
                "Recalculation queued"
            );
            json_response(
                StatusCode::ACCEPTED,
                RecalcAccepted {
                    employee_id,
                    from: request.from,
                    to: request.to,
                    days,
                },
            )
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %err, "Request failed");
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn path_error(correlation_id: Uuid, rejection: PathRejection) -> Response {
    let message = rejection.body_text();
    warn!(correlation_id = %correlation_id, error = %message, "Invalid path parameters");
    json_response(StatusCode::BAD_REQUEST, ApiError::invalid_path(message))
}

fn body_error(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}
