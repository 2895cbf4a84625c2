//! Value types flowing through the averaging engine.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single forecast point: grid carbon intensity at an instant.
///
/// # Examples
///
/// ```
/// use carbon_window::forecast::IntensitySample;
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
/// let s = IntensitySample::new(t, 180.0);
/// assert_eq!(s.value, 180.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensitySample {
    /// Instant the sample applies to.
    pub timestamp: DateTime<Utc>,
    /// Carbon intensity (gCO2/kWh, >= 0).
    pub value: f64,
}

impl IntensitySample {
    /// Creates a sample at `timestamp` with intensity `value`.
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl fmt::Display for IntensitySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{:.1} gCO2/kWh", self.timestamp.to_rfc3339(), self.value)
    }
}

/// Time-weighted average intensity over one fixed-duration window.
///
/// Field order matters: the derived `PartialOrd` compares lexicographically
/// on `(value, start, end, start_value, end_value)`, so among equal averages
/// the earliest window sorts first.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WindowAverage {
    /// Average intensity over `[start, end]` (gCO2/kWh).
    pub value: f64,
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end, always `start + duration`.
    pub end: DateTime<Utc>,
    /// Interpolated intensity at `start`.
    pub start_value: f64,
    /// Intensity at the right boundary.
    pub end_value: f64,
}

impl WindowAverage {
    /// Total ordering over the same key as `PartialOrd`, with floats
    /// compared by `f64::total_cmp`.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| self.start_value.total_cmp(&other.start_value))
            .then_with(|| self.end_value.total_cmp(&other.end_value))
    }
}

impl fmt::Display for WindowAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} | avg={:>7.2} gCO2/kWh (start={:.2}, end={:.2})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            self.value,
            self.start_value,
            self.end_value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn window(value: f64, start_min: i64) -> WindowAverage {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let start = base + TimeDelta::minutes(start_min);
        WindowAverage {
            value,
            start,
            end: start + TimeDelta::minutes(60),
            start_value: value,
            end_value: value,
        }
    }

    #[test]
    fn ordering_is_value_first() {
        assert!(window(100.0, 90) < window(120.0, 0));
        assert_eq!(window(100.0, 90).total_cmp(&window(120.0, 0)), Ordering::Less);
    }

    #[test]
    fn equal_values_order_by_start() {
        assert!(window(150.0, 0) < window(150.0, 30));
        assert_eq!(
            window(150.0, 30).total_cmp(&window(150.0, 0)),
            Ordering::Greater
        );
    }

    #[test]
    fn nan_sorts_last_under_total_cmp() {
        assert_eq!(
            window(f64::NAN, 0).total_cmp(&window(1e9, 0)),
            Ordering::Greater
        );
    }

    #[test]
    fn display_does_not_panic() {
        let s = format!("{}", window(123.4, 0));
        assert!(s.contains("123.40"));
    }
}
