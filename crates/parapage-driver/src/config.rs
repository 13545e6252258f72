use anyhow::Context;
use clap::Parser;
use core::time::Duration;
use parapage::{ErrorPolicy, ListOptions, PaginatorConfig};

/// Runtime configuration for the `parapage-driver` binary.
///
/// The driver runs one pagination pass against a simulated endpoint so worker
/// counts and page sizes can be tuned before pointing the library at a real
/// API. Every value can come from a flag, an environment variable or a `.env`
/// file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parapage-driver",
    version,
    about = "Paginate a simulated list endpoint with a bounded worker pool"
)]
pub struct CliArgs {
    /// Number of workers fetching pages concurrently.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = parapage::DEFAULT_WORKER_COUNT)]
    pub num_workers: usize,

    /// Items requested per page.
    ///
    /// Environment variable: `FETCH_RATE`
    #[arg(long, env = "FETCH_RATE", default_value_t = parapage::DEFAULT_FETCH_RATE)]
    pub fetch_rate: usize,

    /// Capacity of the page channel feeding the gatherer. Defaults to the
    /// worker count.
    ///
    /// Environment variable: `RESULT_BUFFER`
    #[arg(long, env = "RESULT_BUFFER")]
    pub result_buffer: Option<usize>,

    /// Number of items the simulated endpoint holds.
    ///
    /// Environment variable: `TOTAL_ITEMS`
    #[arg(long, env = "TOTAL_ITEMS", default_value_t = 10_000)]
    pub total_items: usize,

    /// Index of the first item to list.
    ///
    /// Environment variable: `OFFSET`
    #[arg(long, env = "OFFSET", default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of items to list. `0` lists everything.
    ///
    /// Environment variable: `LIMIT`
    #[arg(long, env = "LIMIT", default_value_t = 0)]
    pub limit: usize,

    /// Simulated round-trip time of a single page fetch, in milliseconds.
    ///
    /// Environment variable: `LATENCY_MS`
    #[arg(long, env = "LATENCY_MS", default_value_t = 5)]
    pub latency_ms: u64,

    /// Make every request covering this item index fail.
    ///
    /// Environment variable: `FAIL_AT`
    #[arg(long, env = "FAIL_AT")]
    pub fail_at: Option<usize>,

    /// Abort the run on the first failed fetch instead of returning what was
    /// gathered.
    ///
    /// Environment variable: `FAIL_FAST`
    #[arg(long, env = "FAIL_FAST", default_value_t = false)]
    pub fail_fast: bool,

    /// Deadline for a single page fetch, in milliseconds. Unset waits forever.
    ///
    /// Environment variable: `FETCH_TIMEOUT_MS`
    #[arg(long, env = "FETCH_TIMEOUT_MS")]
    pub fetch_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub paginator: PaginatorConfig,
    pub options: ListOptions,
    pub total_items: usize,
    pub latency: Duration,
    pub fail_at: Option<usize>,
}

impl DriverConfig {
    /// Number of items a run without failures should return.
    pub fn expected_items(&self) -> usize {
        let available = self.total_items.saturating_sub(self.options.offset);
        match self.options.limit {
            0 => available,
            limit => available.min(limit),
        }
    }

    /// How many items a run that gathered `gathered` is missing, if any.
    pub fn shortfall(&self, gathered: usize) -> Option<usize> {
        self.expected_items()
            .checked_sub(gathered)
            .filter(|missing| *missing > 0)
    }
}

impl TryFrom<CliArgs> for DriverConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mut paginator = PaginatorConfig::default()
            .with_worker_count(args.num_workers)
            .with_fetch_rate(args.fetch_rate)
            .with_error_policy(if args.fail_fast {
                ErrorPolicy::FailFast
            } else {
                ErrorPolicy::Partial
            });

        if let Some(result_buffer) = args.result_buffer {
            paginator = paginator.with_result_buffer(result_buffer);
        }

        if let Some(ms) = args.fetch_timeout_ms {
            paginator = paginator.with_fetch_timeout(Duration::from_millis(ms));
        }

        // Zero workers, fetch rate, buffers or timeout are all rejected here.
        paginator.validate().context(
            "Rejected paginator settings (NUM_WORKERS, FETCH_RATE, RESULT_BUFFER, FETCH_TIMEOUT_MS)",
        )?;

        Ok(Self {
            paginator,
            options: ListOptions::all()
                .with_offset(args.offset)
                .with_limit(args.limit),
            total_items: args.total_items,
            latency: Duration::from_millis(args.latency_ms),
            fail_at: args.fail_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<DriverConfig> {
        let argv = core::iter::once("parapage-driver").chain(args.iter().copied());
        DriverConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn flags_map_onto_the_paginator() {
        let config = parse(&[
            "--num-workers",
            "8",
            "--fetch-rate",
            "25",
            "--offset",
            "10",
            "--limit",
            "90",
            "--fail-fast",
            "--fetch-timeout-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(config.paginator.worker_count, 8);
        assert_eq!(config.paginator.fetch_rate, 25);
        assert_eq!(config.paginator.error_policy, ErrorPolicy::FailFast);
        assert_eq!(
            config.paginator.fetch_timeout,
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.options, ListOptions::all().with_offset(10).with_limit(90));
    }

    #[test]
    fn zero_knobs_are_rejected_by_the_paginator() {
        for (flag, knob) in [
            ("--num-workers", "worker_count"),
            ("--fetch-rate", "fetch_rate"),
            ("--result-buffer", "result_buffer"),
            ("--fetch-timeout-ms", "fetch_timeout"),
        ] {
            let err = parse(&[flag, "0"]).unwrap_err();
            let chain = format!("{err:#}");
            assert!(chain.contains("Rejected paginator settings"), "{chain}");
            assert!(chain.contains(knob), "{flag}: {chain}");
            let source = err.downcast_ref::<parapage::Error>();
            assert!(
                matches!(source, Some(parapage::Error::InvalidConfig { .. })),
                "{flag}: {chain}"
            );
        }
    }

    #[test]
    fn expected_items_respects_offset_and_limit() {
        let config = parse(&["--total-items", "100", "--offset", "90"]).unwrap();
        assert_eq!(config.expected_items(), 10);

        let config = parse(&["--total-items", "100", "--offset", "10", "--limit", "5"]).unwrap();
        assert_eq!(config.expected_items(), 5);

        let config = parse(&["--total-items", "100", "--offset", "200"]).unwrap();
        assert_eq!(config.expected_items(), 0);
    }

    #[test]
    fn shortfall_counts_missing_items_only() {
        let config = parse(&["--total-items", "100", "--limit", "40"]).unwrap();
        assert_eq!(config.shortfall(40), None);
        assert_eq!(config.shortfall(25), Some(15));
        assert_eq!(config.shortfall(0), Some(40));
        // More than expected is not a shortfall.
        assert_eq!(config.shortfall(41), None);
    }
}
