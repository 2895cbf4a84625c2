//! REST API over a computed plan.
//!
//! Provides three GET endpoints:
//! - `/forecast` - the intensity samples the plan was built from
//! - `/windows` - every candidate window, with optional offset range filtering
//! - `/plan` - scenario config and the plan report

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::ScenarioConfig;
use crate::forecast::{IntensitySample, WindowAverage};
use crate::runner::{self, PlanError, PlanReport};

pub use types::{ErrorResponse, ForecastResponse, PlanResponse, WindowQuery, WindowRecord};

/// Immutable application state shared across all request handlers.
///
/// Built once before serving and wrapped in `Arc`; handlers only read it.
pub struct AppState {
    /// Scenario the plan was computed for.
    pub config: ScenarioConfig,
    /// Forecast samples.
    pub samples: Vec<IntensitySample>,
    /// Every candidate window, in offset order.
    pub windows: Vec<WindowAverage>,
    /// Plan computed from `samples`.
    pub report: PlanReport,
}

impl AppState {
    /// Plans `config` against `samples` and materializes its windows.
    ///
    /// # Errors
    ///
    /// Returns a `PlanError` if no plan can be built. A search that finds
    /// no windows leaves `windows` empty.
    pub fn build(
        config: ScenarioConfig,
        samples: Vec<IntensitySample>,
        start: DateTime<Utc>,
    ) -> Result<Self, PlanError> {
        let report = runner::plan(&config, &samples, start)?;
        let windows = runner::build_averager(&config, &samples, start)
            .map(|averager| averager.iter().collect())
            .unwrap_or_default();
        Ok(Self {
            config,
            samples,
            windows,
            report,
        })
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/forecast", get(handlers::get_forecast))
        .route("/windows", get(handlers::get_windows))
        .route("/plan", get(handlers::get_plan))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
