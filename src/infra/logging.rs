//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout carries only the JSON payloads. The filter is
//! read from `PLAGSCAN_LOG` (e.g. `PLAGSCAN_LOG=plagscan::core=debug`).

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Install the global subscriber; later calls are no-ops.
pub fn init(quiet: bool)
{
    INIT.call_once(|| {
        let fallback = if quiet { "plagscan=warn" } else { "plagscan=info" };
        let filter =
            EnvFilter::try_from_env("PLAGSCAN_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
