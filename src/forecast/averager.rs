//! Sliding time-weighted averages over an intensity forecast.
//!
//! The forecast is treated as a piecewise-linear curve through its samples.
//! For each offset along the sample grid the averager integrates that curve
//! over a window of fixed duration with the trapezoidal rule, interpolating
//! the curve at the window edges rather than snapping to the grid.

use std::iter::{self, FusedIterator};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use super::types::{IntensitySample, WindowAverage};
use crate::error::WindowError;

/// Per-query averager over a borrowed, time-ordered sample sequence.
///
/// Construction truncates and re-anchors the input once; every window is
/// then recomputed on demand, so the averager can be iterated any number
/// of times (and from several threads) with identical results.
///
/// # Examples
///
/// ```
/// use carbon_window::forecast::{IntensitySample, SlidingWindowAverager};
/// use chrono::{TimeDelta, TimeZone, Utc};
///
/// let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
/// let samples = vec![
///     IntensitySample::new(t0, 100.0),
///     IntensitySample::new(t0 + TimeDelta::minutes(30), 100.0),
///     IntensitySample::new(t0 + TimeDelta::minutes(60), 300.0),
/// ];
/// let averager = SlidingWindowAverager::new(&samples, 30, t0).unwrap();
/// assert_eq!(averager.len(), 2);
/// assert_eq!(averager.get(0).unwrap().value, 100.0);
/// assert_eq!(averager.get(1).unwrap().value, 200.0);
/// ```
#[derive(Debug, Clone)]
pub struct SlidingWindowAverager<'a> {
    /// Working samples: truncated to the horizon, index 0 at or before `start`.
    data: &'a [IntensitySample],
    /// Grid spacing, taken from the first two input samples.
    step: TimeDelta,
    duration: TimeDelta,
    start: DateTime<Utc>,
    /// Number of working samples whose span covers one window.
    span: usize,
    /// Number of valid offsets.
    len: usize,
}

impl<'a> SlidingWindowAverager<'a> {
    /// Creates an averager with no lookahead cap or deadline.
    ///
    /// # Errors
    ///
    /// See [`SlidingWindowAverager::with_horizon`].
    pub fn new(
        samples: &'a [IntensitySample],
        duration_minutes: u32,
        start: DateTime<Utc>,
    ) -> Result<Self, WindowError> {
        Self::with_horizon(samples, duration_minutes, start, None, None)
    }

    /// Creates an averager constrained by an optional lookahead cap and an
    /// optional hard deadline for window starts.
    ///
    /// # Arguments
    ///
    /// * `samples` - Strictly increasing, uniformly spaced forecast
    /// * `duration_minutes` - Window duration (must be > 0)
    /// * `start` - Reference instant; offset 0 starts here
    /// * `max_lookahead_minutes` - Latest window start, relative to `start`
    /// * `deadline` - Window starts at or after this instant are excluded
    ///
    /// # Errors
    ///
    /// * [`WindowError::InsufficientForecastData`] if fewer than two samples
    ///   are given or remain after truncation to the horizon
    /// * [`WindowError::InvalidDuration`] if `duration_minutes` is zero
    /// * [`WindowError::InvalidStepSize`] if the first two samples share a
    ///   timestamp or are out of order
    /// * [`WindowError::NoCoverage`] if the forecast ends before `start + duration`
    pub fn with_horizon(
        samples: &'a [IntensitySample],
        duration_minutes: u32,
        start: DateTime<Utc>,
        max_lookahead_minutes: Option<u32>,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Self, WindowError> {
        if samples.len() < 2 {
            return Err(WindowError::InsufficientForecastData {
                available: samples.len(),
            });
        }
        if duration_minutes == 0 {
            return Err(WindowError::InvalidDuration { minutes: 0 });
        }

        let step = samples[1].timestamp - samples[0].timestamp;
        if step <= TimeDelta::zero() {
            return Err(WindowError::InvalidStepSize { step });
        }
        let duration = TimeDelta::minutes(i64::from(duration_minutes));

        let horizon_end = match (max_lookahead_minutes, deadline) {
            (Some(m), Some(d)) => Some((start + TimeDelta::minutes(i64::from(m))).min(d)),
            (Some(m), None) => Some(start + TimeDelta::minutes(i64::from(m))),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        };

        let truncated = match horizon_end {
            Some(end) => {
                let cutoff = end + duration;
                let kept = samples.partition_point(|s| s.timestamp <= cutoff);
                if kept < 2 {
                    return Err(WindowError::InsufficientForecastData { available: kept });
                }
                &samples[..kept]
            }
            None => samples,
        };

        // Latest sample at or before `start`, or the first sample if none is.
        let anchor = truncated
            .partition_point(|s| s.timestamp <= start)
            .saturating_sub(1);
        let data = &truncated[anchor..];

        let window_end = start + duration;
        let span = data
            .iter()
            .position(|s| s.timestamp + step >= window_end)
            .map(|i| i + 1)
            .ok_or(WindowError::NoCoverage { window_end })?;

        let len = window_count(
            data.len(),
            span,
            step,
            start,
            max_lookahead_minutes,
            deadline,
        );

        debug!(
            samples = samples.len(),
            working = data.len(),
            step = %step,
            span,
            windows = len,
            "built sliding window averager"
        );

        Ok(Self {
            data,
            step,
            duration,
            start,
            span,
            len,
        })
    }

    /// Number of valid window offsets.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no window fits the horizon.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forecast grid spacing.
    pub fn step(&self) -> TimeDelta {
        self.step
    }

    /// Window duration.
    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// Reference start instant (start of offset 0).
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Number of working samples spanned by one window.
    pub fn span_count(&self) -> usize {
        self.span
    }

    /// Working samples after truncation and re-anchoring.
    pub fn samples(&self) -> &'a [IntensitySample] {
        self.data
    }

    /// Returns the window anchored at offset `index`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::IndexOutOfRange`] unless `index < self.len()`.
    pub fn get(&self, index: usize) -> Result<WindowAverage, WindowError> {
        if index >= self.len {
            return Err(WindowError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(self.window_at(index))
    }

    /// Iterates all windows in offset order.
    pub fn iter(&self) -> Windows<'_, 'a> {
        Windows {
            averager: self,
            next: 0,
        }
    }

    /// Computes the window at a valid offset. Callers guarantee `index < len`.
    fn window_at(&self, index: usize) -> WindowAverage {
        let window_start = self.start + self.step * index as i32;
        let window_end = window_start + self.duration;

        let left = interpolate(&self.data[index], &self.data[index + 1], window_start);

        let last = self.data.len() - 1;
        let right_idx = index + self.span;
        let right = if right_idx == last {
            self.data[last]
        } else {
            interpolate(
                &self.data[right_idx - 1],
                &self.data[right_idx],
                window_end,
            )
        };

        let inner = &self.data[index + 1..right_idx];
        let mut acc = 0.0;
        let mut prev = left;
        for point in inner.iter().chain(iter::once(&right)) {
            acc += 0.5 * (prev.value + point.value) * seconds(point.timestamp - prev.timestamp);
            prev = *point;
        }
        let elapsed = seconds(right.timestamp - left.timestamp);

        WindowAverage {
            value: acc / elapsed,
            start: window_start,
            end: window_end,
            start_value: left.value,
            end_value: right.value,
        }
    }
}

impl<'s, 'a> IntoIterator for &'s SlidingWindowAverager<'a> {
    type Item = WindowAverage;
    type IntoIter = Windows<'s, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over an averager's windows.
#[derive(Debug, Clone)]
pub struct Windows<'s, 'a> {
    averager: &'s SlidingWindowAverager<'a>,
    next: usize,
}

impl Iterator for Windows<'_, '_> {
    type Item = WindowAverage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.averager.len {
            return None;
        }
        let window = self.averager.window_at(self.next);
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.averager.len - self.next.min(self.averager.len);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_, '_> {}

impl FusedIterator for Windows<'_, '_> {}

/// Linearly interpolates the intensity between `p1` and `p2` at `when`.
///
/// Exact sample instants return the sample's own value. Instants outside
/// `[p1, p2]` are extrapolated along the same line.
pub fn interpolate(p1: &IntensitySample, p2: &IntensitySample, when: DateTime<Utc>) -> IntensitySample {
    if when == p1.timestamp {
        return IntensitySample::new(when, p1.value);
    }
    if when == p2.timestamp {
        return IntensitySample::new(when, p2.value);
    }
    let span = seconds(p2.timestamp - p1.timestamp);
    let offset = seconds(when - p1.timestamp);
    IntensitySample::new(when, p1.value + (p2.value - p1.value) * offset / span)
}

/// Counts offsets whose boundary pairs exist, capped by lookahead and deadline.
fn window_count(
    working_len: usize,
    span: usize,
    step: TimeDelta,
    start: DateTime<Utc>,
    max_lookahead_minutes: Option<u32>,
    deadline: Option<DateTime<Utc>>,
) -> usize {
    let mut count = working_len.saturating_sub(span);
    if count == 0 {
        return 0;
    }

    if let Some(minutes) = max_lookahead_minutes {
        let max_offset = (nanos(TimeDelta::minutes(i64::from(minutes))) / nanos(step)) as usize;
        count = count.min(max_offset + 1);
    }

    if let Some(deadline) = deadline {
        if let Some(first_late) =
            (0..count).find(|&i| start + step * i as i32 >= deadline)
        {
            count = first_late;
        }
    }

    count
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

fn nanos(delta: TimeDelta) -> i128 {
    i128::from(delta.num_seconds()) * 1_000_000_000 + i128::from(delta.subsec_nanos())
}
