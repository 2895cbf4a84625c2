//! Windowed forecast averaging and optimal-window selection.

pub mod averager;
pub mod selector;
/// Seeded synthetic forecast generation.
pub mod synthetic;
pub mod types;

pub use averager::{SlidingWindowAverager, Windows, interpolate};
pub use selector::{NowVsBest, OptimalWindowSelector};
pub use synthetic::SyntheticForecast;
pub use types::{IntensitySample, WindowAverage};
