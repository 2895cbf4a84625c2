//! Minimum-average window selection.

use serde::Serialize;

use super::averager::SlidingWindowAverager;
use super::types::WindowAverage;
use crate::error::WindowError;

/// Running immediately versus the carbon-optimal start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NowVsBest {
    /// Window starting at the reference instant (offset 0).
    pub now: WindowAverage,
    /// Window with the lowest average intensity.
    pub best: WindowAverage,
}

/// Picks carbon-optimal windows from a [`SlidingWindowAverager`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OptimalWindowSelector;

impl OptimalWindowSelector {
    /// Returns the window with the lowest average across every offset.
    ///
    /// Ties resolve to the earliest start, following `WindowAverage` ordering.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::NoWindows`] if the averager is empty.
    pub fn best_window(averager: &SlidingWindowAverager<'_>) -> Result<WindowAverage, WindowError> {
        averager
            .iter()
            .min_by(WindowAverage::total_cmp)
            .ok_or(WindowError::NoWindows)
    }

    /// Returns offset 0 alongside the best window.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::NoWindows`] if the averager is empty.
    pub fn compare_now_vs_best(
        averager: &SlidingWindowAverager<'_>,
    ) -> Result<NowVsBest, WindowError> {
        let best = Self::best_window(averager)?;
        let now = averager.get(0)?;
        Ok(NowVsBest { now, best })
    }
}
