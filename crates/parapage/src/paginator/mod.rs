//! The orchestrator that wires a pagination run together.
//!
//! [`Paginator`] wraps a [`PageSource`] and turns the sequential "fetch until
//! an empty page" loop into a parallel one:
//!
//! 1. Validate the configuration. Nothing is spawned on failure.
//! 2. Spawn the generator, `worker_count` workers and the gatherer.
//! 3. Join every worker.
//! 4. Drop the last page sender so the gatherer sees the channel close.
//! 5. Join the gatherer, then the generator, and return the collection.
//!
//! Step 3 must finish before step 4: the page channel may only close once no
//! worker can send on it.
//!
//! Item order in the result follows fetch completion, not page order. Sort by
//! an item field if order matters.


use crate::{
    config::{PaginatorConfig, PipelineSettings},
    error::{Error, Result},
    pipeline::{
        gatherer::gather,
        generator::generate_requests,
        worker::{Worker, fetch_loop},
    },
    request::ListOptions,
    signal::CompletionSignal,
    source::PageSource,
    stats::{FetchStats, StatsRecorder},
};
use core::future::Future;
use std::sync::Arc;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

/// Items gathered by one run, together with its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReport<T> {
    pub items: Vec<T>,
    pub stats: FetchStats,
}

/// Fetches every page of a [`PageSource`] with a fixed pool of workers.
///
/// The paginator is a thin wrapper: the source is still reachable through
/// [`Paginator::source`] for calls that need no pagination.
///
/// All methods that run the pipeline spawn Tokio tasks and must be called from
/// within a Tokio runtime. A multi-threaded runtime gives true parallelism.
pub struct Paginator<S> {
    source: Arc<S>,
    config: PaginatorConfig,
}

impl<S> Clone for Paginator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
        }
    }
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S, config: PaginatorConfig) -> Self {
        Self::from_arc(Arc::new(source), config)
    }

    /// Shares an existing source instead of taking ownership of one.
    pub const fn from_arc(source: Arc<S>, config: PaginatorConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub const fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    /// Lists every item covered by `options`, navigating pagination.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if the configuration is rejected. Returned
    ///   before any task starts.
    /// - [`Error::FetchFailed`] or [`Error::FetchTimeout`] for the first fetch
    ///   failure, only under [`ErrorPolicy::FailFast`].
    /// - [`Error::TaskFailed`] if a pipeline task panicked.
    ///
    /// [`ErrorPolicy::FailFast`]: crate::ErrorPolicy::FailFast
    pub async fn list_all(&self, options: ListOptions) -> Result<Vec<S::Item>> {
        self.list_all_with_report(options)
            .await
            .map(|report| report.items)
    }

    /// Same as [`Paginator::list_all`], also returning the run's
    /// [`FetchStats`].
    ///
    /// # Errors
    ///
    /// See [`Paginator::list_all`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            skip_all,
            fields(
                offset = options.offset,
                limit = options.limit,
                workers = self.config.worker_count,
                fetch_rate = self.config.fetch_rate,
            )
        )
    )]
    pub async fn list_all_with_report(&self, options: ListOptions) -> Result<ListReport<S::Item>> {
        let settings = self.config.validate()?;
        run(Arc::clone(&self.source), settings, options).await
    }
}

async fn run<S: PageSource>(
    source: Arc<S>,
    settings: PipelineSettings,
    options: ListOptions,
) -> Result<ListReport<S::Item>> {
    let done = CompletionSignal::new();
    let stats = Arc::new(StatsRecorder::default());

    let (request_tx, request_rx) = mpsc::channel(settings.request_buffer.get());
    let (page_tx, page_rx) = mpsc::channel(settings.result_buffer.get());

    let generator = spawn(generate_requests(
        options,
        settings.fetch_rate,
        request_tx,
        done.clone(),
    ));

    // Workers hold the only handles to the receiver, so the generator notices
    // when the last of them exits.
    let requests = Arc::new(Mutex::new(request_rx));
    let workers: Vec<_> = (0..settings.worker_count.get())
        .map(|worker_id| {
            spawn(fetch_loop(
                worker_id,
                Worker {
                    source: Arc::clone(&source),
                    requests: Arc::clone(&requests),
                    pages: page_tx.clone(),
                    done: done.clone(),
                    stats: Arc::clone(&stats),
                    error_policy: settings.error_policy,
                    fetch_timeout: settings.fetch_timeout,
                },
            ))
        })
        .collect();
    drop(requests);

    let gatherer = spawn(gather(page_rx, Arc::clone(&stats)));

    let mut task_error = None;
    for joined in futures::future::join_all(workers).await {
        match joined {
            Ok(_exit) => {
                #[cfg(feature = "tracing")]
                tracing::trace!("Worker exited: {_exit:?}");
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Worker task failed: {e}");
                if task_error.is_none() {
                    task_error = Some(Error::from(e));
                }
            }
        }
    }

    // Every worker is gone; closing the page channel now cannot race a send.
    drop(page_tx);
    let gathered = gatherer.await;

    match generator.await {
        Ok(_emitted) => {
            #[cfg(feature = "tracing")]
            tracing::debug!("Generator emitted {_emitted} requests");
        }
        Err(e) => {
            if task_error.is_none() {
                task_error = Some(Error::from(e));
            }
        }
    }

    let gathered = gathered?;
    if let Some(e) = task_error.or(gathered.error) {
        return Err(e);
    }

    let stats = stats.snapshot();
    #[cfg(feature = "tracing")]
    tracing::debug!(
        "Listed {} items in {} pages ({} empty, {} failed)",
        stats.items_gathered,
        stats.pages_fetched,
        stats.empty_pages,
        stats.fetch_failures
    );

    Ok(ListReport {
        items: gathered.items,
        stats,
    })
}

/// Spawns a pipeline task, carrying the caller's span along when tracing.
fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    #[cfg(feature = "tracing")]
    let fut = {
        use tracing::Instrument;
        fut.in_current_span()
    };

    tokio::spawn(fut)
}
