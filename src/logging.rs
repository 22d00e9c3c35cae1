//! Tracing setup for binaries and local runs.
//!
//! Filter comes from `RUST_LOG` when set, otherwise a quiet default that keeps
//! the engine's own `recommender` target at info. `RECOMMENDER_LOG_JSON=1`
//! switches to JSON lines.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "RECOMMENDER_LOG_JSON";
const DEFAULT_FILTER: &str = "hybrid_recommender=info,recommender=info,warn";

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_JSON)
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };

    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
