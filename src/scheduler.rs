//! Threshold-based run-now-or-defer decisions for delayable jobs.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::forecast::{IntensitySample, OptimalWindowSelector, SlidingWindowAverager, WindowAverage};

/// Coarse intensity band, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Greenness {
    /// Below 200 gCO2/kWh.
    High,
    /// 200 to 400 gCO2/kWh.
    Medium,
    /// 400 gCO2/kWh and above.
    Low,
}

impl Greenness {
    /// Buckets an intensity (gCO2/kWh).
    pub fn from_intensity(g_per_kwh: f64) -> Self {
        if g_per_kwh < 200.0 {
            Self::High
        } else if g_per_kwh < 400.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Short operator-facing advice for the band.
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::High => "clean grid, run jobs now",
            Self::Medium => "consider waiting for a cleaner window",
            Self::Low => "dirty grid, defer jobs",
        }
    }
}

impl fmt::Display for Greenness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        };
        f.write_str(label)
    }
}

/// A delayable compute job.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Human-readable job name.
    pub name: String,
    /// Expected run time (minutes, > 0).
    pub duration_minutes: u32,
    /// Average power draw while running (W).
    pub power_watts: f64,
    /// Run immediately only when current intensity is below this (gCO2/kWh).
    pub threshold_g_per_kwh: f64,
    /// Batch ordering priority, from `MIN_PRIORITY` to `MAX_PRIORITY`.
    pub priority: u8,
}

impl Job {
    /// Lowest priority.
    pub const MIN_PRIORITY: u8 = 1;
    /// Highest priority.
    pub const MAX_PRIORITY: u8 = 5;
    /// Priority of jobs that do not set one.
    pub const DEFAULT_PRIORITY: u8 = Self::MIN_PRIORITY;
}

/// Outcome of a scheduling decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Grid is clean enough; start immediately.
    RunNow {
        /// Start instant.
        at: DateTime<Utc>,
        /// Intensity that allowed the start (gCO2/kWh).
        intensity: f64,
    },
    /// Start at the carbon-optimal window within the horizon.
    Deferred {
        /// Selected window.
        window: WindowAverage,
    },
    /// Window search failed; start after the fixed fallback delay.
    Fallback {
        /// Start instant.
        at: DateTime<Utc>,
        /// Why the window search failed.
        reason: String,
    },
}

impl Decision {
    /// Instant the job should start.
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Self::RunNow { at, .. } | Self::Fallback { at, .. } => *at,
            Self::Deferred { window } => window.start,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunNow { at, intensity } => write!(
                f,
                "run now at {} ({intensity:.1} gCO2/kWh)",
                at.format("%Y-%m-%d %H:%M")
            ),
            Self::Deferred { window } => write!(
                f,
                "deferred to {} ({:.1} gCO2/kWh avg)",
                window.start.format("%Y-%m-%d %H:%M"),
                window.value
            ),
            Self::Fallback { at, reason } => write!(
                f,
                "fallback start at {} ({reason})",
                at.format("%Y-%m-%d %H:%M")
            ),
        }
    }
}

/// Runs a job now when the grid is below its threshold, otherwise defers
/// it to the best window within a fixed horizon.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdScheduler {
    horizon_minutes: u32,
    fallback_delay: TimeDelta,
    deadline: Option<DateTime<Utc>>,
}

impl Default for ThresholdScheduler {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_HORIZON_MINUTES,
            Self::DEFAULT_FALLBACK_DELAY_MINUTES,
        )
    }
}

impl ThresholdScheduler {
    /// Search horizon used when none is configured (24 h).
    pub const DEFAULT_HORIZON_MINUTES: u32 = 24 * 60;
    /// Fallback delay used when none is configured (6 h).
    pub const DEFAULT_FALLBACK_DELAY_MINUTES: u32 = 6 * 60;

    /// Creates a scheduler searching `horizon_minutes` ahead and falling
    /// back to `fallback_delay_minutes` when the search fails.
    pub fn new(horizon_minutes: u32, fallback_delay_minutes: u32) -> Self {
        Self {
            horizon_minutes,
            fallback_delay: TimeDelta::minutes(i64::from(fallback_delay_minutes)),
            deadline: None,
        }
    }

    /// Excludes windows starting at or after `deadline`.
    pub fn with_deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Search horizon in minutes.
    pub fn horizon_minutes(&self) -> u32 {
        self.horizon_minutes
    }

    /// Decides when `job` should start.
    ///
    /// # Arguments
    ///
    /// * `job` - Job to place
    /// * `current_intensity` - Grid intensity at `now` (gCO2/kWh)
    /// * `samples` - Forecast covering the horizon
    /// * `now` - Decision instant
    pub fn decide(
        &self,
        job: &Job,
        current_intensity: f64,
        samples: &[IntensitySample],
        now: DateTime<Utc>,
    ) -> Decision {
        if current_intensity < job.threshold_g_per_kwh {
            info!(
                job = %job.name,
                intensity = current_intensity,
                threshold = job.threshold_g_per_kwh,
                "grid below threshold, running now"
            );
            return Decision::RunNow {
                at: now,
                intensity: current_intensity,
            };
        }

        let search = SlidingWindowAverager::with_horizon(
            samples,
            job.duration_minutes,
            now,
            Some(self.horizon_minutes),
            self.deadline,
        )
        .and_then(|averager| OptimalWindowSelector::best_window(&averager));

        match search {
            Ok(window) => {
                info!(
                    job = %job.name,
                    start = %window.start,
                    average = window.value,
                    "deferred to lowest-intensity window"
                );
                Decision::Deferred { window }
            }
            Err(e) => {
                let at = now + self.fallback_delay;
                warn!(job = %job.name, error = %e, fallback = %at, "window search failed");
                Decision::Fallback {
                    at,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Decides every job in `jobs`, highest priority first.
    ///
    /// Jobs of equal priority keep their input order. Every job sees the
    /// same `current_intensity` and forecast.
    pub fn decide_all<'j>(
        &self,
        jobs: &'j [Job],
        current_intensity: f64,
        samples: &[IntensitySample],
        now: DateTime<Utc>,
    ) -> Vec<(&'j Job, Decision)> {
        let mut queue: Vec<&Job> = jobs.iter().collect();
        queue.sort_by(|a, b| b.priority.cmp(&a.priority));
        debug!(jobs = queue.len(), "deciding batch");
        queue
            .into_iter()
            .map(|job| (job, self.decide(job, current_intensity, samples, now)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn job(threshold: f64) -> Job {
        Job {
            name: "train".to_string(),
            duration_minutes: 60,
            power_watts: 300.0,
            threshold_g_per_kwh: threshold,
            priority: Job::DEFAULT_PRIORITY,
        }
    }

    fn forecast() -> Vec<IntensitySample> {
        [450.0, 420.0, 380.0, 120.0, 110.0, 130.0, 400.0, 410.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| IntensitySample::new(at(30 * i as i64), v))
            .collect()
    }

    #[test]
    fn greenness_bands() {
        assert_eq!(Greenness::from_intensity(150.0), Greenness::High);
        assert_eq!(Greenness::from_intensity(200.0), Greenness::Medium);
        assert_eq!(Greenness::from_intensity(399.9), Greenness::Medium);
        assert_eq!(Greenness::from_intensity(400.0), Greenness::Low);
        assert_eq!(Greenness::Low.to_string(), "LOW");
    }

    #[test]
    fn below_threshold_runs_now() {
        let d = ThresholdScheduler::default().decide(&job(500.0), 450.0, &forecast(), at(0));
        assert_eq!(
            d,
            Decision::RunNow {
                at: at(0),
                intensity: 450.0
            }
        );
    }

    #[test]
    fn threshold_is_strict() {
        let d = ThresholdScheduler::default().decide(&job(450.0), 450.0, &forecast(), at(0));
        assert!(matches!(d, Decision::Deferred { .. }));
    }

    #[test]
    fn above_threshold_defers_to_best_window() {
        let d = ThresholdScheduler::default().decide(&job(300.0), 450.0, &forecast(), at(0));
        match d {
            Decision::Deferred { window } => {
                assert_eq!(window.start, at(90));
                assert!((window.value - 117.5).abs() < 1e-9);
            }
            other => panic!("expected deferral, got {other:?}"),
        }
    }

    #[test]
    fn deadline_limits_deferral() {
        let d = ThresholdScheduler::default()
            .with_deadline(Some(at(60)))
            .decide(&job(300.0), 450.0, &forecast(), at(0));
        match d {
            Decision::Deferred { window } => assert_eq!(window.start, at(30)),
            other => panic!("expected deferral, got {other:?}"),
        }
    }

    #[test]
    fn failed_search_falls_back_to_fixed_delay() {
        let short = vec![IntensitySample::new(at(0), 450.0)];
        let d = ThresholdScheduler::new(24 * 60, 360).decide(&job(300.0), 450.0, &short, at(0));
        assert_eq!(d.start(), at(360));
        assert!(matches!(d, Decision::Fallback { .. }));
    }

    #[test]
    fn batch_runs_highest_priority_first() {
        let named = |name: &str, threshold: f64, priority: u8| Job {
            name: name.to_string(),
            priority,
            ..job(threshold)
        };
        let jobs = vec![
            named("report", 300.0, 1),
            named("train", 500.0, 5),
            named("etl", 300.0, 3),
            named("backup", 300.0, 1),
        ];
        let decided = ThresholdScheduler::default().decide_all(&jobs, 450.0, &forecast(), at(0));

        let order: Vec<&str> = decided.iter().map(|(j, _)| j.name.as_str()).collect();
        assert_eq!(order, ["train", "etl", "report", "backup"]);
        assert!(matches!(decided[0].1, Decision::RunNow { .. }));
        for (_, d) in &decided[1..] {
            assert_eq!(d.start(), at(90));
        }
    }

    #[test]
    fn empty_batch_decides_nothing() {
        let decided = ThresholdScheduler::default().decide_all(&[], 450.0, &forecast(), at(0));
        assert!(decided.is_empty());
    }
}
