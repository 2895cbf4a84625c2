//! Error types for the windowed averaging and selection engine.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// Failures raised while building an averager or querying its windows.
///
/// All variants are deterministic and local: retrying the same query with
/// the same input yields the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    /// Fewer than two samples were supplied, or remain after truncation.
    #[error("insufficient forecast data: {available} sample(s) available, at least 2 required")]
    InsufficientForecastData { available: usize },
    /// The forecast never reaches the end of the first window.
    #[error("forecast does not cover the window ending at {window_end}")]
    NoCoverage { window_end: DateTime<Utc> },
    /// A window offset outside `[0, len)` was requested.
    #[error("window index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// Selection was attempted on an averager exposing no windows.
    #[error("no candidate windows in the search horizon")]
    NoWindows,
    /// Window duration must be strictly positive.
    #[error("window duration must be > 0 minutes, got {minutes}")]
    InvalidDuration { minutes: i64 },
    /// The first two samples are not strictly increasing in time.
    #[error("forecast step size must be positive, got {step}")]
    InvalidStepSize { step: TimeDelta },
}
