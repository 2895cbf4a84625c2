//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::footprint::HardwareUnit;
use crate::scheduler::{Job, ThresholdScheduler};

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// The job to place.
    #[serde(default)]
    pub job: JobConfig,
    /// Where the intensity forecast comes from.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Window search horizon.
    #[serde(default)]
    pub search: SearchConfig,
    /// Facility footprint parameters.
    #[serde(default)]
    pub footprint: FootprintConfig,
    /// Threshold scheduler fallback policy.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Job parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Job name used in logs and reports.
    pub name: String,
    /// Expected run time (minutes, must be > 0).
    pub duration_minutes: u32,
    /// Average power draw (W, must be > 0).
    pub power_watts: f64,
    /// Intensity below which the job runs immediately (gCO2/kWh).
    pub threshold_g_per_kwh: f64,
    /// Batch ordering priority (1 = low, 5 = high).
    pub priority: u8,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: "batch-job".to_string(),
            duration_minutes: 60,
            power_watts: 300.0,
            threshold_g_per_kwh: 400.0,
            priority: Job::DEFAULT_PRIORITY,
        }
    }
}

/// Forecast source parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Source: `"synthetic"` or `"csv"`.
    pub source: String,
    /// CSV file path, required when `source = "csv"`.
    pub path: Option<PathBuf>,
    /// Grid region code for the synthetic source.
    pub region: String,
    /// Synthetic forecast length (hours).
    pub hours: u32,
    /// Synthetic sample spacing (minutes).
    pub step_minutes: u32,
    /// Synthetic noise seed.
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            source: "synthetic".to_string(),
            path: None,
            region: "GB".to_string(),
            hours: 48,
            step_minutes: 30,
            seed: 42,
        }
    }
}

/// Window search horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Latest window start relative to `start` (minutes).
    pub lookahead_minutes: Option<u32>,
    /// Hard deadline for window starts (RFC 3339).
    pub deadline: Option<DateTime<Utc>>,
    /// Reference start instant (RFC 3339); the current time when absent.
    pub start: Option<DateTime<Utc>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lookahead_minutes: Some(ThresholdScheduler::DEFAULT_HORIZON_MINUTES),
            deadline: None,
            start: None,
        }
    }
}

/// Facility footprint parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FootprintConfig {
    /// Power usage effectiveness (>= 1.0).
    pub pue: f64,
    /// Hardware mix; empty means a single unit at `job.power_watts`.
    pub hardware: Vec<HardwareUnit>,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            pue: 1.0,
            hardware: Vec::new(),
        }
    }
}

/// Fallback policy for failed window searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Delay applied when no window can be selected (minutes).
    pub fallback_delay_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fallback_delay_minutes: ThresholdScheduler::DEFAULT_FALLBACK_DELAY_MINUTES,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"job.duration_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: a one-hour 300 W job on the GB grid.
    pub fn baseline() -> Self {
        Self {
            job: JobConfig::default(),
            forecast: ForecastConfig::default(),
            search: SearchConfig::default(),
            footprint: FootprintConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Returns the overnight-training preset: a long multi-GPU job with a
    /// strict threshold and a datacenter PUE.
    pub fn overnight_training() -> Self {
        Self {
            job: JobConfig {
                name: "overnight-training".to_string(),
                duration_minutes: 240,
                power_watts: 1600.0,
                threshold_g_per_kwh: 120.0,
                priority: 4,
            },
            forecast: ForecastConfig {
                seed: 7,
                ..ForecastConfig::default()
            },
            search: SearchConfig::default(),
            footprint: FootprintConfig {
                pue: 1.4,
                hardware: vec![HardwareUnit {
                    units: 4,
                    watts_per_unit: 400.0,
                }],
            },
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Returns the coal-heavy preset: a short job on a high-intensity grid
    /// that can never meet its threshold.
    pub fn coal_heavy() -> Self {
        Self {
            job: JobConfig {
                name: "nightly-etl".to_string(),
                duration_minutes: 90,
                power_watts: 450.0,
                threshold_g_per_kwh: 400.0,
                priority: 2,
            },
            forecast: ForecastConfig {
                region: "IN".to_string(),
                seed: 11,
                ..ForecastConfig::default()
            },
            search: SearchConfig {
                lookahead_minutes: Some(12 * 60),
                ..SearchConfig::default()
            },
            footprint: FootprintConfig {
                pue: 1.6,
                hardware: Vec::new(),
            },
            scheduler: SchedulerConfig {
                fallback_delay_minutes: 180,
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "overnight_training", "coal_heavy"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "overnight_training" => Ok(Self::overnight_training()),
            "coal_heavy" => Ok(Self::coal_heavy()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// A relative `forecast.path` is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let (Some(csv), Some(dir)) = (&cfg.forecast.path, path.parent()) {
            if csv.is_relative() {
                cfg.forecast.path = Some(dir.join(csv));
            }
        }
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// The configured job.
    pub fn to_job(&self) -> Job {
        Job {
            name: self.job.name.clone(),
            duration_minutes: self.job.duration_minutes,
            power_watts: self.job.power_watts,
            threshold_g_per_kwh: self.job.threshold_g_per_kwh,
            priority: self.job.priority,
        }
    }

    /// Hardware mix for footprint estimates, defaulting to the job's own draw.
    pub fn hardware(&self) -> Vec<HardwareUnit> {
        if self.footprint.hardware.is_empty() {
            vec![HardwareUnit {
                units: 1,
                watts_per_unit: self.job.power_watts,
            }]
        } else {
            self.footprint.hardware.clone()
        }
    }

    /// Threshold scheduler built from the search horizon, deadline and fallback policy.
    pub fn scheduler(&self) -> ThresholdScheduler {
        ThresholdScheduler::new(
            self.search
                .lookahead_minutes
                .unwrap_or(ThresholdScheduler::DEFAULT_HORIZON_MINUTES),
            self.scheduler.fallback_delay_minutes,
        )
        .with_deadline(self.search.deadline)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let j = &self.job;
        if j.duration_minutes == 0 {
            errors.push(ConfigError {
                field: "job.duration_minutes".into(),
                message: "must be > 0".into(),
            });
        }
        if !(j.power_watts.is_finite() && j.power_watts > 0.0) {
            errors.push(ConfigError {
                field: "job.power_watts".into(),
                message: "must be a finite number > 0".into(),
            });
        }
        if !(j.threshold_g_per_kwh.is_finite() && j.threshold_g_per_kwh > 0.0) {
            errors.push(ConfigError {
                field: "job.threshold_g_per_kwh".into(),
                message: "must be a finite number > 0".into(),
            });
        }
        if !(Job::MIN_PRIORITY..=Job::MAX_PRIORITY).contains(&j.priority) {
            errors.push(ConfigError {
                field: "job.priority".into(),
                message: format!(
                    "must be between {} and {}",
                    Job::MIN_PRIORITY,
                    Job::MAX_PRIORITY
                ),
            });
        }

        let fc = &self.forecast;
        match fc.source.as_str() {
            "synthetic" => {
                if fc.step_minutes == 0 {
                    errors.push(ConfigError {
                        field: "forecast.step_minutes".into(),
                        message: "must be > 0".into(),
                    });
                } else if u64::from(fc.hours) * 60 < 2 * u64::from(fc.step_minutes) {
                    errors.push(ConfigError {
                        field: "forecast.hours".into(),
                        message: "must cover at least two forecast steps".into(),
                    });
                }
            }
            "csv" => {
                if fc.path.is_none() {
                    errors.push(ConfigError {
                        field: "forecast.path".into(),
                        message: "required when forecast.source = \"csv\"".into(),
                    });
                }
            }
            other => errors.push(ConfigError {
                field: "forecast.source".into(),
                message: format!("must be \"synthetic\" or \"csv\", got \"{other}\""),
            }),
        }

        let s = &self.search;
        if let (Some(start), Some(deadline)) = (s.start, s.deadline) {
            if deadline <= start {
                errors.push(ConfigError {
                    field: "search.deadline".into(),
                    message: "must be after search.start".into(),
                });
            }
        }

        let fp = &self.footprint;
        if !(fp.pue.is_finite() && fp.pue >= 1.0) {
            errors.push(ConfigError {
                field: "footprint.pue".into(),
                message: "must be >= 1.0".into(),
            });
        }
        for (i, hw) in fp.hardware.iter().enumerate() {
            if !(hw.watts_per_unit.is_finite() && hw.watts_per_unit >= 0.0) {
                errors.push(ConfigError {
                    field: format!("footprint.hardware[{i}].watts_per_unit"),
                    message: "must be a finite number >= 0".into(),
                });
            }
        }

        errors
    }
}
