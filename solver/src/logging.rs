//! Diagnostic tracing for the solver.
//!
//! Output goes to stderr so that stdout only carries tool results. Problem
//! state itself is persisted by the stores, never through logs.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn`.
///
/// # Example
/// ```bash
/// RUST_LOG=problem_solver=debug problem-solver call continue-last-problem
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
