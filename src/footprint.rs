//! Emission estimates derived from window averages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::forecast::WindowAverage;

/// A homogeneous group of compute units drawing the same power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareUnit {
    /// Number of identical units (e.g. GPUs).
    pub units: u32,
    /// Power draw of one unit (W).
    pub watts_per_unit: f64,
}

/// Emissions of running now versus at the best window, in kgCO2.
///
/// `savings_kg` is not clamped: a negative value means the "best" window
/// would emit more than starting now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SavingsEstimate {
    /// Emissions when starting immediately (kgCO2).
    pub now_kg: f64,
    /// Emissions when starting at the best window (kgCO2).
    pub best_kg: f64,
    /// `now_kg - best_kg` (kgCO2).
    pub savings_kg: f64,
    /// Savings relative to `now_kg`, or 0 when `now_kg` is not positive.
    pub savings_pct: f64,
}

/// Facility-level footprint for a job, in gCO2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FootprintEstimates {
    /// Footprint at the current average intensity (gCO2).
    pub now_g: f64,
    /// Footprint at the best average intensity (gCO2).
    pub best_g: f64,
    /// `now_g - best_g`, unclamped (gCO2).
    pub savings_g: f64,
}

/// Pure conversions from power, time and intensity to emitted mass.
#[derive(Debug, Default, Clone, Copy)]
pub struct FootprintEstimator;

impl FootprintEstimator {
    /// Emitted mass in kgCO2 for a constant draw over a duration.
    ///
    /// # Arguments
    ///
    /// * `power_watts` - Average power draw (W)
    /// * `duration_minutes` - Run time (minutes)
    /// * `intensity_g_per_kwh` - Grid carbon intensity (gCO2/kWh)
    ///
    /// # Examples
    ///
    /// ```
    /// use carbon_window::footprint::FootprintEstimator;
    ///
    /// let kg = FootprintEstimator::estimate_emissions(300.0, 60.0, 200.0);
    /// assert!((kg - 0.06).abs() < 1e-12);
    /// ```
    pub fn estimate_emissions(power_watts: f64, duration_minutes: f64, intensity_g_per_kwh: f64) -> f64 {
        (power_watts / 1000.0) * (duration_minutes / 60.0) * (intensity_g_per_kwh / 1000.0)
    }

    /// Compares the emissions of two windows for the same job.
    pub fn estimate_savings(
        now: &WindowAverage,
        best: &WindowAverage,
        power_watts: f64,
        duration_minutes: f64,
    ) -> SavingsEstimate {
        let now_kg = Self::estimate_emissions(power_watts, duration_minutes, now.value);
        let best_kg = Self::estimate_emissions(power_watts, duration_minutes, best.value);
        let savings_kg = now_kg - best_kg;
        let savings_pct = if now_kg > 0.0 {
            100.0 * savings_kg / now_kg
        } else {
            0.0
        };
        SavingsEstimate {
            now_kg,
            best_kg,
            savings_kg,
            savings_pct,
        }
    }

    /// Facility energy times intensity for a hardware mix.
    ///
    /// Energy (kWh) is `pue * runtime_h * sum(units * watts_per_unit) / 1000`.
    pub fn estimate_footprint_reduction(
        pue: f64,
        hardware: &[HardwareUnit],
        runtime_seconds: f64,
        avg_best_intensity: f64,
        avg_now_intensity: f64,
    ) -> FootprintEstimates {
        let watts: f64 = hardware
            .iter()
            .map(|h| f64::from(h.units) * h.watts_per_unit)
            .sum();
        let energy_kwh = pue * (runtime_seconds / 3600.0) * watts / 1000.0;
        let now_g = energy_kwh * avg_now_intensity;
        let best_g = energy_kwh * avg_best_intensity;
        FootprintEstimates {
            now_g,
            best_g,
            savings_g: now_g - best_g,
        }
    }
}

impl fmt::Display for SavingsEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Emissions now:         {:.4} kgCO2", self.now_kg)?;
        writeln!(f, "Emissions at best:     {:.4} kgCO2", self.best_kg)?;
        write!(
            f,
            "Savings:               {:.4} kgCO2 ({:.1}%)",
            self.savings_kg, self.savings_pct
        )
    }
}

impl fmt::Display for FootprintEstimates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Facility footprint:    now={:.1} g  best={:.1} g  saved={:.1} g",
            self.now_g, self.best_g, self.savings_g
        )
    }
}
