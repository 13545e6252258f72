#![doc = include_str!("../README.md")]

mod config;
mod source;
mod telemetry;

use clap::Parser;
use config::{CliArgs, DriverConfig};
use parapage::Paginator;
use source::SimulatedSource;
use std::sync::Arc;
use telemetry::init_telemetry;
use tokio::time::Instant;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = DriverConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let source = Arc::new(SimulatedSource::new(
        config.total_items,
        config.latency,
        config.fail_at,
    ));
    let paginator = Paginator::from_arc(Arc::clone(&source), config.paginator.clone());

    let started = Instant::now();
    let report = match paginator.list_all_with_report(config.options).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(request = ?e.request(), "Listing failed: {e}");
            return Err(e.into());
        }
    };
    let elapsed = started.elapsed();

    let stats = report.stats;
    tracing::info!(
        items = report.items.len(),
        pages = stats.pages_fetched,
        empty_pages = stats.empty_pages,
        failures = stats.fetch_failures,
        calls = source.calls(),
        ?elapsed,
        "Listing finished"
    );

    if let Some(missing) = config.shortfall(report.items.len()) {
        tracing::warn!(
            policy = ?config.paginator.error_policy,
            "Result is incomplete: missing {} of {} items after {} failed fetches",
            missing,
            config.expected_items(),
            stats.fetch_failures
        );
    }

    Ok(())
}

fn log_startup_info(config: &DriverConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting pagination run with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting pagination run over {} items with {} workers fetching {} per page",
            config.total_items,
            config.paginator.worker_count,
            config.paginator.fetch_rate
        );
    }
}
