//! Window averaging and selection properties over realistic forecasts.

mod common;

use carbon_window::error::WindowError;
use carbon_window::forecast::{OptimalWindowSelector, SlidingWindowAverager, WindowAverage};
use chrono::TimeDelta;
use common::{at, daily_cycle, series, trough_forecast};

#[test]
fn windows_are_step_spaced_and_duration_long() {
    let data = daily_cycle();
    let avg = SlidingWindowAverager::new(&data, 90, at(10)).unwrap();
    assert!(!avg.is_empty());
    for (i, w) in avg.iter().enumerate() {
        assert_eq!(w.start, at(10) + TimeDelta::minutes(30 * i as i64));
        assert_eq!(w.end - w.start, TimeDelta::minutes(90));
    }
}

#[test]
fn iterator_matches_random_access() {
    let data = daily_cycle();
    let avg = SlidingWindowAverager::new(&data, 60, at(0)).unwrap();
    let collected: Vec<WindowAverage> = avg.iter().collect();
    assert_eq!(collected.len(), avg.len());
    for (i, w) in collected.iter().enumerate() {
        assert_eq!(*w, avg.get(i).unwrap());
    }
    assert_eq!(
        avg.get(avg.len()),
        Err(WindowError::IndexOutOfRange {
            index: avg.len(),
            len: avg.len()
        })
    );
}

#[test]
fn best_window_is_the_minimum_and_never_worse_than_now() {
    let data = daily_cycle();
    let avg = SlidingWindowAverager::new(&data, 60, at(0)).unwrap();
    let cmp = OptimalWindowSelector::compare_now_vs_best(&avg).unwrap();
    assert!(cmp.best.value <= cmp.now.value);
    assert!(avg.iter().all(|w| cmp.best.value <= w.value));
    // Trough of the cosine is at 12:00; the symmetric window is centred on it.
    assert_eq!(cmp.best.start, at(11 * 60 + 30));
}

#[test]
fn averages_stay_within_sample_range() {
    let data = daily_cycle();
    let avg = SlidingWindowAverager::new(&data, 120, at(45)).unwrap();
    for w in &avg {
        assert!(w.value >= 150.0 - 1e-9 && w.value <= 350.0 + 1e-9, "{w}");
    }
}

#[test]
fn constant_forecast_gives_constant_windows() {
    let data = series(15, &[222.0; 20]);
    let avg = SlidingWindowAverager::new(&data, 40, at(7)).unwrap();
    for w in &avg {
        assert!((w.value - 222.0).abs() < 1e-9);
    }
}

#[test]
fn deadline_and_lookahead_bound_window_starts() {
    let data = daily_cycle();
    let deadline = at(6 * 60);
    let avg = SlidingWindowAverager::with_horizon(&data, 60, at(0), Some(8 * 60), Some(deadline))
        .unwrap();
    assert_eq!(avg.len(), 12);
    assert!(avg.iter().all(|w| w.start < deadline));

    let capped = SlidingWindowAverager::with_horizon(&data, 60, at(0), Some(60), None).unwrap();
    assert_eq!(capped.len(), 3);
}

#[test]
fn selection_in_trough_forecast() {
    let data = trough_forecast();
    let avg = SlidingWindowAverager::new(&data, 60, at(0)).unwrap();
    let best = OptimalWindowSelector::best_window(&avg).unwrap();
    assert_eq!(best.start, at(90));
    assert!((best.value - 117.5).abs() < 1e-9);
}

#[test]
fn forecast_too_short_for_window() {
    let data = series(30, &[100.0, 120.0]);
    let err = SlidingWindowAverager::new(&data, 120, at(0)).unwrap_err();
    assert!(matches!(err, WindowError::NoCoverage { .. }));
}

#[test]
fn shared_averager_reads_identically_across_threads() {
    let data = daily_cycle();
    let avg = SlidingWindowAverager::new(&data, 75, at(20)).unwrap();
    let expected: Vec<WindowAverage> = avg.iter().collect();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| avg.iter().collect::<Vec<_>>()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}
