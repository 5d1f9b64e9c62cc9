//! Prometheus metrics for observability and monitoring.
//!
//! This module describes and records the metrics emitted by the workspace:
//! - Store action and effect handling
//! - Booking pipeline outcomes
//! - Booking desk batches and budgets
//!
//! # Example
//!
//! ```rust,no_run
//! use airfare_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! // ... run bookings ...
//!
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

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

/// Prometheus metrics recorder.
///
/// Installs the process-wide recorder and renders the collected metrics in
/// the Prometheus text format.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe every metric and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), installation is
    /// skipped with a warning and [`render`](Self::render) returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 7.5, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::debug!("Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
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

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder hasn't been installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store Metrics
    describe_counter!(
        "store.actions.received",
        "Total number of actions reduced by the store"
    );
    describe_counter!(
        "store.effects.executed",
        "Total number of effects started, by type"
    );
    describe_counter!(
        "store.effects.cancelled",
        "Total number of effect tasks stopped by cancellation, by type"
    );
    describe_counter!(
        "store.shutdown.initiated",
        "Total number of shutdowns started"
    );
    describe_counter!(
        "store.shutdown.completed",
        "Total number of shutdowns whose effects finished before the timeout"
    );
    describe_counter!(
        "store.shutdown.timeout",
        "Total number of shutdowns that had to cancel running effects"
    );

    // Booking Pipeline Metrics
    describe_counter!(
        "booking_requests_total",
        "Total number of booking pipelines started"
    );
    describe_counter!(
        "booking_tickets_issued_total",
        "Total number of tickets issued"
    );
    describe_counter!(
        "booking_failures_total",
        "Total number of bookings that produced no ticket, by reason"
    );
    describe_histogram!(
        "booking_pipeline_duration_seconds",
        "Time taken by one booking pipeline"
    );

    // Booking Desk Metrics
    describe_counter!(
        "booking_desk_late_arrivals_total",
        "Total number of pipeline results ignored because the request was no longer pending"
    );
    describe_counter!(
        "booking_desk_budget_elapsed_total",
        "Total number of batches whose time budget elapsed"
    );
}

/// Booking pipeline metrics recorder.
pub struct BookingMetrics;

impl BookingMetrics {
    /// Record a pipeline start.
    pub fn record_request() {
        counter!("booking_requests_total").increment(1);
    }

    /// Record an issued ticket.
    pub fn record_ticket(duration: Duration) {
        counter!("booking_tickets_issued_total").increment(1);
        histogram!("booking_pipeline_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a booking that produced no ticket.
    pub fn record_failure(reason: &'static str, duration: Duration) {
        counter!("booking_failures_total", "reason" => reason).increment(1);
        histogram!("booking_pipeline_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Booking desk metrics recorder.
pub struct DeskMetrics;

impl DeskMetrics {
    /// Record a result that arrived after its request stopped being pending.
    pub fn record_late_arrival() {
        counter!("booking_desk_late_arrivals_total").increment(1);
    }

    /// Record a batch whose budget elapsed, with the requests it cancelled.
    pub fn record_budget_elapsed(cancelled: usize) {
        counter!("booking_desk_budget_elapsed_total").increment(1);
        counter!("booking_failures_total", "reason" => "cancelled").increment(cancelled as u64);
    }
}
