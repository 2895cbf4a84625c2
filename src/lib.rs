//! Carbon-aware window planning: sliding averages over grid-intensity
//! forecasts, optimal start selection and emission estimates.

/// REST API for querying a computed plan (feature-gated).
#[cfg(feature = "api")]
pub mod api;
/// TOML scenario configuration and presets.
pub mod config;
pub mod error;
pub mod footprint;
pub mod forecast;
/// File input and output.
pub mod io;
pub mod runner;
pub mod scheduler;
