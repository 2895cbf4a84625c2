//! File input and output.

/// CSV export of window averages.
pub mod export;
/// CSV forecast loading.
pub mod forecast_csv;
