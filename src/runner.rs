//! End-to-end planning: load a forecast, average it, pick a window and
//! price the difference.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ScenarioConfig;
use crate::error::WindowError;
use crate::footprint::{FootprintEstimates, FootprintEstimator, SavingsEstimate};
use crate::forecast::{
    IntensitySample, NowVsBest, OptimalWindowSelector, SlidingWindowAverager, SyntheticForecast,
};
use crate::io::forecast_csv::{ForecastLoadError, read_forecast_csv};
use crate::scheduler::{Decision, Greenness};

/// Failures while producing a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("forecast.path is required when forecast.source = \"csv\"")]
    MissingForecastPath,
    #[error("unknown forecast source \"{0}\"")]
    UnknownSource(String),
    #[error(transparent)]
    Load(#[from] ForecastLoadError),
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Everything the CLI and API report about one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Job name.
    pub job: String,
    /// Forecast region (synthetic source) or `"csv"`.
    pub region: String,
    /// Reference instant for offset 0.
    pub start: DateTime<Utc>,
    /// Number of candidate windows searched.
    pub window_count: usize,
    /// Intensity at the reference instant (gCO2/kWh).
    pub current_intensity: f64,
    /// Band of `current_intensity`.
    pub greenness: Greenness,
    /// Offset 0 against the lowest-average window; `None` without windows.
    pub comparison: Option<NowVsBest>,
    /// Job emissions now versus at the best window.
    pub savings: Option<SavingsEstimate>,
    /// Facility footprint including PUE and the hardware mix.
    pub footprint: Option<FootprintEstimates>,
    /// Why the window search produced nothing.
    pub search_error: Option<String>,
    /// Threshold scheduler outcome.
    pub decision: Decision,
}

/// Reference instant: the configured `search.start`, or now.
pub fn resolve_start(cfg: &ScenarioConfig) -> DateTime<Utc> {
    cfg.search.start.unwrap_or_else(Utc::now)
}

/// Loads the forecast named by `cfg.forecast`.
///
/// The synthetic source is anchored on `start`; CSV files are read as-is.
///
/// # Errors
///
/// Returns a `PlanError` if the source is unknown, the CSV path is
/// missing, or the file cannot be parsed.
pub fn load_samples(
    cfg: &ScenarioConfig,
    start: DateTime<Utc>,
) -> Result<Vec<IntensitySample>, PlanError> {
    let f = &cfg.forecast;
    let samples = match f.source.as_str() {
        "synthetic" => SyntheticForecast::new(f.region.clone(), f.seed).generate(
            start,
            f.hours,
            f.step_minutes,
        ),
        "csv" => {
            let path = f.path.as_deref().ok_or(PlanError::MissingForecastPath)?;
            read_forecast_csv(path)?
        }
        other => return Err(PlanError::UnknownSource(other.to_string())),
    };
    debug!(source = %f.source, samples = samples.len(), "forecast loaded");
    Ok(samples)
}

/// Builds the averager for the configured job and search horizon.
///
/// # Errors
///
/// Propagates [`SlidingWindowAverager::with_horizon`] failures.
pub fn build_averager<'a>(
    cfg: &ScenarioConfig,
    samples: &'a [IntensitySample],
    start: DateTime<Utc>,
) -> Result<SlidingWindowAverager<'a>, WindowError> {
    SlidingWindowAverager::with_horizon(
        samples,
        cfg.job.duration_minutes,
        start,
        cfg.search.lookahead_minutes,
        cfg.search.deadline,
    )
}

/// Plans a scenario against a loaded forecast.
///
/// A window search that finds nothing still yields a report: the
/// comparison and estimates are absent and the decision falls back to
/// the threshold scheduler's policy.
///
/// # Errors
///
/// Returns a `PlanError` if `samples` is empty.
pub fn plan(
    cfg: &ScenarioConfig,
    samples: &[IntensitySample],
    start: DateTime<Utc>,
) -> Result<PlanReport, PlanError> {
    let search = build_averager(cfg, samples, start).and_then(|averager| {
        OptimalWindowSelector::compare_now_vs_best(&averager).map(|cmp| (averager.len(), cmp))
    });
    let (window_count, comparison, search_error) = match search {
        Ok((count, cmp)) => (count, Some(cmp), None),
        Err(e) => {
            debug!(error = %e, "no candidate windows");
            (0, None, Some(e.to_string()))
        }
    };

    let current_intensity = match comparison {
        Some(cmp) => cmp.now.start_value,
        None => intensity_at(samples, start)?,
    };

    let job = cfg.to_job();
    let minutes = f64::from(job.duration_minutes);
    let savings = comparison.map(|NowVsBest { now, best }| {
        FootprintEstimator::estimate_savings(&now, &best, job.power_watts, minutes)
    });
    let footprint = comparison.map(|NowVsBest { now, best }| {
        FootprintEstimator::estimate_footprint_reduction(
            cfg.footprint.pue,
            &cfg.hardware(),
            minutes * 60.0,
            best.value,
            now.value,
        )
    });

    let decision = cfg
        .scheduler()
        .decide(&job, current_intensity, samples, start);

    info!(
        job = %job.name,
        windows = window_count,
        start = %decision.start(),
        savings_kg = savings.map(|s| s.savings_kg),
        "plan ready"
    );

    Ok(PlanReport {
        job: job.name,
        region: match cfg.forecast.source.as_str() {
            "csv" => "csv".to_string(),
            _ => cfg.forecast.region.clone(),
        },
        start,
        window_count,
        current_intensity,
        greenness: Greenness::from_intensity(current_intensity),
        comparison,
        savings,
        footprint,
        search_error,
        decision,
    })
}

/// Value of the latest sample at or before `at`, or of the first sample.
fn intensity_at(samples: &[IntensitySample], at: DateTime<Utc>) -> Result<f64, PlanError> {
    let idx = samples
        .partition_point(|s| s.timestamp <= at)
        .saturating_sub(1);
    samples
        .get(idx)
        .map(|s| s.value)
        .ok_or(PlanError::Window(WindowError::InsufficientForecastData { available: 0 }))
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_time = |t: DateTime<Utc>| t.format("%Y-%m-%d %H:%M UTC").to_string();
        writeln!(f, "--- Plan: {} ({}) ---", self.job, self.region)?;
        writeln!(f, "Reference start:       {}", fmt_time(self.start))?;
        writeln!(
            f,
            "Current intensity:     {:.1} gCO2/kWh [{}: {}]",
            self.current_intensity,
            self.greenness,
            self.greenness.recommendation()
        )?;
        writeln!(f, "Windows searched:      {}", self.window_count)?;
        match self.comparison {
            Some(cmp) => {
                writeln!(
                    f,
                    "Window now:            {} avg {:.1} gCO2/kWh",
                    fmt_time(cmp.now.start),
                    cmp.now.value
                )?;
                writeln!(
                    f,
                    "Best window:           {} avg {:.1} gCO2/kWh",
                    fmt_time(cmp.best.start),
                    cmp.best.value
                )?;
            }
            None => writeln!(
                f,
                "Best window:           no candidate windows ({})",
                self.search_error.as_deref().unwrap_or("empty horizon")
            )?,
        }
        if let Some(savings) = self.savings {
            writeln!(f, "{savings}")?;
        }
        if let Some(footprint) = self.footprint {
            writeln!(f, "{footprint}")?;
        }
        write!(f, "Decision:              {}", self.decision)
    }
}
