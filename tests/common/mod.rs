//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use carbon_window::config::ScenarioConfig;
use carbon_window::forecast::IntensitySample;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// Fixed reference instant (2026-03-01T00:00:00Z) shifted by `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(minutes)
}

/// Samples starting at `at(0)` spaced `step_minutes` apart.
pub fn series(step_minutes: i64, values: &[f64]) -> Vec<IntensitySample> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| IntensitySample::new(at(step_minutes * i as i64), v))
        .collect()
}

/// Half-hourly forecast with a clean trough at 01:30-02:30.
pub fn trough_forecast() -> Vec<IntensitySample> {
    series(30, &[450.0, 420.0, 380.0, 120.0, 110.0, 130.0, 400.0, 410.0])
}

/// A day of half-hourly samples with a smooth daily cycle.
pub fn daily_cycle() -> Vec<IntensitySample> {
    let values: Vec<f64> = (0..48)
        .map(|i| {
            let phase = (i as f64) / 48.0 * std::f64::consts::TAU;
            250.0 + 100.0 * phase.cos()
        })
        .collect();
    series(30, &values)
}

/// Baseline preset pinned to `at(0)` so synthetic output is reproducible.
pub fn pinned_baseline() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.search.start = Some(at(0));
    cfg
}

/// Path to a file under the crate's `scenarios/` directory.
pub fn scenario_path(name: &str) -> String {
    format!("{}/scenarios/{name}", env!("CARGO_MANIFEST_DIR"))
}
