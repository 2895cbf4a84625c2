//! API response and query types.
//!
//! Window field names match the CSV export header.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::forecast::{IntensitySample, WindowAverage};
use crate::runner::PlanReport;

/// Forecast samples with their source.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Region code, or `"csv"` for file-backed forecasts.
    pub region: String,
    /// Samples in timestamp order.
    pub samples: Vec<IntensitySample>,
}

/// One candidate window.
#[derive(Debug, Serialize)]
pub struct WindowRecord {
    /// Offset from the reference start.
    pub offset: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Time-weighted average intensity (gCO2/kWh).
    pub avg_g_per_kwh: f64,
    pub start_g_per_kwh: f64,
    pub end_g_per_kwh: f64,
}

impl WindowRecord {
    /// Tags a window with its offset.
    pub fn new(offset: usize, w: &WindowAverage) -> Self {
        Self {
            offset,
            start: w.start,
            end: w.end,
            avg_g_per_kwh: w.value,
            start_g_per_kwh: w.start_value,
            end_g_per_kwh: w.end_value,
        }
    }
}

/// Scenario config and plan report.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub config: ScenarioConfig,
    pub report: PlanReport,
}

/// Optional offset range for the windows endpoint.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    /// First offset (inclusive).
    pub from: Option<usize>,
    /// Last offset (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
