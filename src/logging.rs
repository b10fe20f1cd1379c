//! Structured logging setup.
//!
//! Logs go to **stderr** through a `tracing` subscriber filtered by
//! `RUST_LOG`. Lifecycle transitions log at `info`, every poll and HTTP
//! round-trip at `debug`, and response bodies at `trace`.
//!
//! ```bash
//! # Follow polling progress for this crate only
//! RUST_LOG=warn,confluent_provider=debug ./apply
//! ```
//!
//! Sensitive attribute values never reach the log: resource snapshots are
//! passed through [`crate::mapper::redacted`] before being recorded.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

fn filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

fn layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the global subscriber at the [`DEFAULT_FILTER`] level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_FILTER);
}

/// Install the global subscriber, using `default_directives` when `RUST_LOG`
/// is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_directives: &str) {
    tracing_subscriber::registry()
        .with(filter(default_directives))
        .with(layer())
        .init();
}

/// Install the global subscriber unless one is already set.
///
/// Returns `false` when a subscriber was already installed, which is the
/// normal case when several tests share a process.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(filter(DEFAULT_FILTER))
        .with(layer())
        .try_init()
        .is_ok()
}
