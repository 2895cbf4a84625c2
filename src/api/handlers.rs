//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, ForecastResponse, PlanResponse, WindowQuery, WindowRecord};

/// Returns the forecast samples.
///
/// `GET /forecast` → 200 + `ForecastResponse` JSON
pub async fn get_forecast(State(state): State<Arc<AppState>>) -> Json<ForecastResponse> {
    Json(ForecastResponse {
        region: state.report.region.clone(),
        samples: state.samples.clone(),
    })
}

/// Returns candidate windows, optionally filtered by offset range.
///
/// `GET /windows` → 200 + `Vec<WindowRecord>` JSON
/// `GET /windows?from=N&to=M` → filtered range (inclusive)
/// `GET /windows?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_windows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<WindowRecord> = state
        .windows
        .iter()
        .enumerate()
        .skip(from)
        .take_while(|(offset, _)| *offset <= to)
        .map(|(offset, w)| WindowRecord::new(offset, w))
        .collect();

    Ok(Json(records))
}

/// Returns the scenario config and plan report.
///
/// `GET /plan` → 200 + `PlanResponse` JSON
pub async fn get_plan(State(state): State<Arc<AppState>>) -> Json<PlanResponse> {
    Json(PlanResponse {
        config: state.config.clone(),
        report: state.report.clone(),
    })
}
