//! Metric names and the optional Prometheus recorder.
//!
//! The engine records through the `metrics` facade only; without an installed
//! recorder every call is a no-op.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const RUNS_TOTAL: &str = "recommender_runs_total";
pub const CANDIDATES_TOTAL: &str = "recommender_candidates_total";
pub const RESULTS_TOTAL: &str = "recommender_results_total";
pub const SCORER_FAILURES_TOTAL: &str = "recommender_scorer_failures_total";
pub const PERSIST_FAILURES_TOTAL: &str = "recommender_persist_failures_total";
pub const COMPUTE_MS: &str = "recommender_compute_ms";
pub const SCORER_TIMEOUT_MS: &str = "recommender_scorer_timeout_ms";

/// One-time metrics registration (so series carry help text once a recorder is installed).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(RUNS_TOTAL, "Recommendation computations started.");
        describe_counter!(
            CANDIDATES_TOTAL,
            "Candidates produced per source before dedup."
        );
        describe_counter!(RESULTS_TOTAL, "Candidates returned after fusion.");
        describe_counter!(
            SCORER_FAILURES_TOTAL,
            "Scorer runs that failed or timed out and were treated as empty."
        );
        describe_counter!(
            PERSIST_FAILURES_TOTAL,
            "Failed appends to the recommendation store."
        );
        describe_histogram!(COMPUTE_MS, "End-to-end computation time in milliseconds.");
        describe_gauge!(SCORER_TIMEOUT_MS, "Configured per-scorer timeout in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder globally. Call once per process.
    pub fn init(scorer_timeout_ms: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        ensure_metrics_described();
        gauge!(SCORER_TIMEOUT_MS).set(scorer_timeout_ms as f64);

        Ok(Self { handle })
    }

    /// Prometheus exposition text for everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
