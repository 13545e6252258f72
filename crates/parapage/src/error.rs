//! Error types for the pagination engine.
//!
//! This module defines the central [`Error`] enum, which captures every
//! reportable failure of a [`Paginator`] run.
//!
//! ## Error Cases
//! - `InvalidConfig`: The caller supplied a configuration that cannot start a
//!   pipeline (zero workers, zero fetch rate, ...). Always surfaced before any
//!   task is spawned.
//! - `FetchFailed`: The [`PageSource`] returned an error for a request.
//! - `FetchTimeout`: A fetch did not complete within the configured deadline.
//! - `TaskFailed`: A pipeline task panicked or was aborted.
//!
//! Whether `FetchFailed` and `FetchTimeout` reach the caller depends on the
//! active [`ErrorPolicy`].
//!
//! [`Paginator`]: crate::Paginator
//! [`PageSource`]: crate::PageSource
//! [`ErrorPolicy`]: crate::ErrorPolicy

use crate::request::PageRequest;
use core::time::Duration;

pub type Result<T> = core::result::Result<T, Error>;

/// A type-erased error returned by a [`PageSource`](crate::PageSource).
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Unified error type for the pagination engine.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The paginator configuration or list options were rejected.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The page source failed to serve a request.
    #[error("Fetch failed for {request}: {source}")]
    FetchFailed {
        request: PageRequest,
        #[source]
        source: BoxError,
    },

    /// The page source did not answer a request in time.
    #[error("Fetch timed out for {request} after {timeout:?}")]
    FetchTimeout {
        request: PageRequest,
        timeout: Duration,
    },

    /// A generator, worker or gatherer task did not finish cleanly.
    #[error("Task error: {context}")]
    TaskFailed { context: String },
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns the request that triggered this error, if it came from a fetch.
    pub const fn request(&self) -> Option<PageRequest> {
        match self {
            Self::FetchFailed { request, .. } | Self::FetchTimeout { request, .. } => {
                Some(*request)
            }
            Self::InvalidConfig { .. } | Self::TaskFailed { .. } => None,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        let context = if err.is_panic() {
            format!("pipeline task panicked: {err}")
        } else {
            format!("pipeline task cancelled: {err}")
        };
        Self::TaskFailed { context }
    }
}
