//! Tracing initialization for binaries and integration tests.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are no-ops, so tests can each
/// request initialization without coordinating.
pub fn init_telemetry() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "quarry=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    tracing::debug!("Telemetry initialized");
}
