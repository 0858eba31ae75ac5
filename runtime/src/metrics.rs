//! Prometheus metrics for observability and monitoring.
//!
//! The store records counters and histograms through the `metrics` facade.
//! Nothing is exported unless a recorder is installed; [`MetricsRecorder`]
//! installs the Prometheus one and renders its text exposition on demand.
//!
//! # Example
//!
//! ```rust,no_run
//! use storefront_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installs the global Prometheus recorder and renders snapshots of it.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe all store metrics and install the Prometheus recorder.
    ///
    /// If another recorder is already installed (common in tests) this logs a
    /// warning and leaves the handle empty.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                register_metrics();
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this recorder was never installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register descriptions for the metrics the store emits.
fn register_metrics() {
    describe_counter!("store.actions.total", "Total number of actions folded by the store");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside the reducer per action"
    );
    describe_histogram!("store.effects.count", "Number of effects returned per action");
    describe_counter!("store.effects.executed", "Effects executed, labelled by type");
    describe_counter!("store.shutdown.initiated", "Graceful shutdowns started");
    describe_counter!("store.shutdown.completed", "Graceful shutdowns that drained all effects");
    describe_counter!("store.shutdown.timeout", "Graceful shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
    describe_counter!("store.operations.started", "Remote operations admitted by the store");
    describe_counter!(
        "store.shutdown.rejected_operations",
        "Remote operations refused because the store was shutting down"
    );
}
