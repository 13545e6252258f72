//! Console logging for the driver.
//!
//! Events from the driver and from the `parapage` pipeline are printed through
//! `tracing_subscriber::fmt`. Verbosity follows `RUST_LOG` and defaults to
//! `info`. Use `RUST_LOG=parapage=debug` to see per-worker activity.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;

    Ok(())
}
