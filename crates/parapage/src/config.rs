//! Tuning knobs for a [`Paginator`](crate::Paginator).
//!
//! ## Key Concepts
//! - **Parallelism**: `worker_count` fetch workers race for requests on one
//!   shared channel.
//! - **Page size**: `fetch_rate` items are asked for per call (the last
//!   request of a bounded run may ask for fewer).
//! - **Backpressure**: `request_buffer` and `result_buffer` bound the two
//!   channels, so a slow gatherer stalls the workers and slow workers stall
//!   the generator.
//! - **Failures**: [`ErrorPolicy`] decides whether a failed fetch ends the run
//!   with an error or just stops the worker that saw it.

use crate::error::{Error, Result};
use core::{num::NonZeroUsize, time::Duration};

/// Number of workers concurrently fetching pages. Chosen after benchmarking
/// against a quad-core host.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Items requested per page.
pub const DEFAULT_FETCH_RATE: usize = 100;

/// Capacity of the generator-to-worker channel. Tokio channels need at least
/// one slot, so this is the closest thing to a rendezvous.
pub const DEFAULT_REQUEST_BUFFER: usize = 1;

/// What a worker does when the source fails a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the failing worker only. The run still succeeds with whatever the
    /// other workers gathered, which may be incomplete. The failure is counted
    /// in [`FetchStats::fetch_failures`](crate::FetchStats) and logged.
    #[default]
    Partial,
    /// Raise the completion signal, drain the pipeline and return the first
    /// failure to the caller.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorConfig {
    pub worker_count: usize,
    pub fetch_rate: usize,
    /// Defaults to `worker_count` when `None`.
    pub result_buffer: Option<usize>,
    pub request_buffer: usize,
    pub error_policy: ErrorPolicy,
    /// Deadline for a single fetch call. `None` waits forever.
    pub fetch_timeout: Option<Duration>,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            fetch_rate: DEFAULT_FETCH_RATE,
            result_buffer: None,
            request_buffer: DEFAULT_REQUEST_BUFFER,
            error_policy: ErrorPolicy::default(),
            fetch_timeout: None,
        }
    }
}

impl PaginatorConfig {
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub const fn with_fetch_rate(mut self, fetch_rate: usize) -> Self {
        self.fetch_rate = fetch_rate;
        self
    }

    pub const fn with_result_buffer(mut self, result_buffer: usize) -> Self {
        self.result_buffer = Some(result_buffer);
        self
    }

    pub const fn with_request_buffer(mut self, request_buffer: usize) -> Self {
        self.request_buffer = request_buffer;
        self
    }

    pub const fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub const fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = Some(fetch_timeout);
        self
    }

    /// Checks every knob and returns the settings the pipeline runs with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a count or buffer is zero, or if
    /// the fetch timeout is zero.
    pub fn validate(&self) -> Result<PipelineSettings> {
        let worker_count = NonZeroUsize::new(self.worker_count)
            .ok_or_else(|| Error::invalid_config("worker_count must be greater than 0"))?;

        let fetch_rate = NonZeroUsize::new(self.fetch_rate)
            .ok_or_else(|| Error::invalid_config("fetch_rate must be greater than 0"))?;

        let result_buffer = NonZeroUsize::new(self.result_buffer.unwrap_or(self.worker_count))
            .ok_or_else(|| Error::invalid_config("result_buffer must be greater than 0"))?;

        let request_buffer = NonZeroUsize::new(self.request_buffer)
            .ok_or_else(|| Error::invalid_config("request_buffer must be greater than 0"))?;

        if self.fetch_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::invalid_config(
                "fetch_timeout must be greater than 0 when set",
            ));
        }

        Ok(PipelineSettings {
            worker_count,
            fetch_rate,
            result_buffer,
            request_buffer,
            error_policy: self.error_policy,
            fetch_timeout: self.fetch_timeout,
        })
    }
}

/// A validated [`PaginatorConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub worker_count: NonZeroUsize,
    pub fetch_rate: NonZeroUsize,
    pub result_buffer: NonZeroUsize,
    pub request_buffer: NonZeroUsize,
    pub error_policy: ErrorPolicy,
    pub fetch_timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = PaginatorConfig::default().validate().unwrap();
        assert_eq!(settings.worker_count.get(), DEFAULT_WORKER_COUNT);
        assert_eq!(settings.fetch_rate.get(), DEFAULT_FETCH_RATE);
        assert_eq!(settings.result_buffer.get(), DEFAULT_WORKER_COUNT);
        assert_eq!(settings.request_buffer.get(), DEFAULT_REQUEST_BUFFER);
        assert_eq!(settings.error_policy, ErrorPolicy::Partial);
        assert_eq!(settings.fetch_timeout, None);
    }

    #[test]
    fn result_buffer_follows_worker_count() {
        let settings = PaginatorConfig::default()
            .with_worker_count(9)
            .validate()
            .unwrap();
        assert_eq!(settings.result_buffer.get(), 9);

        let settings = PaginatorConfig::default()
            .with_worker_count(9)
            .with_result_buffer(2)
            .validate()
            .unwrap();
        assert_eq!(settings.result_buffer.get(), 2);
    }

    #[test]
    fn rejects_zero_knobs() {
        let cases = [
            PaginatorConfig::default().with_worker_count(0),
            PaginatorConfig::default().with_fetch_rate(0),
            PaginatorConfig::default().with_result_buffer(0),
            PaginatorConfig::default().with_request_buffer(0),
            PaginatorConfig::default().with_fetch_timeout(Duration::ZERO),
        ];

        for config in cases {
            match config.validate() {
                Err(Error::InvalidConfig { .. }) => {}
                other => panic!("expected InvalidConfig for {config:?}, got {other:?}"),
            }
        }
    }
}
