//! End-to-end planning over presets and scenario files.

mod common;

use std::path::Path;

use carbon_window::config::ScenarioConfig;
use carbon_window::runner::{self, PlanError};
use carbon_window::scheduler::Decision;
use common::{at, pinned_baseline, scenario_path, trough_forecast};

#[test]
fn presets_plan_deterministically_with_a_pinned_start() {
    for name in ScenarioConfig::PRESETS {
        let mut cfg = ScenarioConfig::from_preset(name).unwrap();
        cfg.search.start = Some(at(0));
        let start = runner::resolve_start(&cfg);

        let a = runner::load_samples(&cfg, start).unwrap();
        let b = runner::load_samples(&cfg, start).unwrap();
        assert_eq!(a, b, "{name}: forecast should be reproducible");

        let report = runner::plan(&cfg, &a, start).unwrap();
        assert!(report.window_count > 0, "{name}");
        let cmp = report.comparison.expect("windows were searched");
        assert!(
            cmp.best.value <= cmp.now.value,
            "{name}: best window should never be worse than now"
        );
        assert!(report.savings.unwrap().savings_kg >= 0.0, "{name}");
    }
}

#[test]
fn coal_heavy_never_runs_now() {
    let mut cfg = ScenarioConfig::coal_heavy();
    cfg.search.start = Some(at(0));
    let samples = runner::load_samples(&cfg, at(0)).unwrap();
    let report = runner::plan(&cfg, &samples, at(0)).unwrap();
    assert!(matches!(report.decision, Decision::Deferred { .. }));
    assert!(report.decision.start() < at(12 * 60 + 1));
}

#[test]
fn seed_changes_the_synthetic_forecast() {
    let cfg = pinned_baseline();
    let mut other = cfg.clone();
    other.forecast.seed = cfg.forecast.seed + 1;
    let a = runner::load_samples(&cfg, at(0)).unwrap();
    let b = runner::load_samples(&other, at(0)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn csv_scenario_resolves_relative_forecast_path() {
    let cfg = ScenarioConfig::from_toml_file(Path::new(&scenario_path("csv_forecast.toml"))).unwrap();
    assert!(cfg.validate().is_empty());
    let start = runner::resolve_start(&cfg);
    assert_eq!(start, at(0));

    let samples = runner::load_samples(&cfg, start).unwrap();
    assert_eq!(samples.len(), 48);

    let report = runner::plan(&cfg, &samples, start).unwrap();
    // Starts from 00:00 up to, not including, the 10:00 deadline.
    assert_eq!(report.window_count, 20);
    assert_eq!(report.region, "csv");
    let cmp = report.comparison.unwrap();
    assert!((cmp.now.value - 187.5).abs() < 1e-9);
    assert_eq!(cmp.best.start, at(4 * 60));
    assert!((cmp.best.value - 128.75).abs() < 1e-9);
    assert_eq!(report.decision.start(), at(4 * 60));

    // 250 W for two hours = 0.5 kWh, times PUE 1.2 for the facility figure.
    let savings = report.savings.unwrap();
    let footprint = report.footprint.unwrap();
    assert!((savings.savings_kg - 0.5 * (187.5 - 128.75) / 1000.0).abs() < 1e-12);
    assert!((footprint.savings_g - 0.6 * (187.5 - 128.75)).abs() < 1e-9);
}

#[test]
fn missing_csv_file_is_a_load_error() {
    let mut cfg = pinned_baseline();
    cfg.forecast.source = "csv".to_string();
    cfg.forecast.path = Some(scenario_path("does_not_exist.csv").into());
    assert!(matches!(
        runner::load_samples(&cfg, at(0)),
        Err(PlanError::Load(_))
    ));
}

#[test]
fn clean_grid_runs_now() {
    let mut cfg = pinned_baseline();
    cfg.job.threshold_g_per_kwh = 500.0;
    let report = runner::plan(&cfg, &trough_forecast(), at(0)).unwrap();
    assert_eq!(
        report.decision,
        Decision::RunNow {
            at: at(0),
            intensity: 450.0
        }
    );
}

#[test]
fn empty_horizon_still_decides() {
    let mut cfg = pinned_baseline();
    cfg.search.start = None;
    cfg.search.deadline = Some(at(0));
    assert!(cfg.validate().is_empty());

    cfg.job.threshold_g_per_kwh = 300.0;
    let report = runner::plan(&cfg, &trough_forecast(), at(0)).unwrap();
    assert_eq!(report.window_count, 0);
    assert!(report.comparison.is_none());
    assert!(report.savings.is_none());
    assert!(report.search_error.is_some());
    assert_eq!(report.current_intensity, 450.0);
    assert!(matches!(report.decision, Decision::Fallback { .. }));
    assert_eq!(report.decision.start(), at(6 * 60));
    assert!(report.to_string().contains("no candidate windows"));

    cfg.job.threshold_g_per_kwh = 1000.0;
    let report = runner::plan(&cfg, &trough_forecast(), at(0)).unwrap();
    assert!(report.comparison.is_none());
    assert_eq!(
        report.decision,
        Decision::RunNow {
            at: at(0),
            intensity: 450.0
        }
    );
}
