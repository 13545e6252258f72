use crate::{
    config::ErrorPolicy,
    error::{Error, Result},
    request::PageRequest,
    signal::CompletionSignal,
    source::PageSource,
    stats::StatsRecorder,
};
use core::time::Duration;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Receiving half of the request channel, shared by every worker. Whoever
/// holds the lock takes the next request, so each request reaches exactly one
/// worker.
pub(crate) type SharedRequests = Arc<Mutex<mpsc::Receiver<PageRequest>>>;

/// What flows from workers to the gatherer.
pub(crate) type PageResult<T> = Result<Vec<T>>;

/// Everything a fetch worker needs for one run.
pub(crate) struct Worker<S: PageSource> {
    pub(crate) source: Arc<S>,
    pub(crate) requests: SharedRequests,
    pub(crate) pages: mpsc::Sender<PageResult<S::Item>>,
    pub(crate) done: CompletionSignal,
    pub(crate) stats: Arc<StatsRecorder>,
    pub(crate) error_policy: ErrorPolicy,
    pub(crate) fetch_timeout: Option<Duration>,
}

/// How a worker's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// The request channel closed.
    Drained,
    /// A request arrived for an offset already known to be past the end.
    Completed,
    /// This worker fetched an empty page.
    EmptyPage,
    /// The source failed a request.
    Failed,
    /// The gatherer stopped receiving.
    Disconnected,
}

/// Worker task: takes one request at a time off the shared channel, fetches
/// it and hands non-empty pages to the gatherer.
///
/// An empty page raises the completion signal and ends the worker. A failed
/// fetch ends the worker as well; under [`ErrorPolicy::FailFast`] it also
/// raises the signal and forwards the error so the gatherer can report it.
///
/// A fetch already in flight is never interrupted by the signal. The worker
/// only checks it after receiving its next request, and then only refuses
/// requests at or past the recorded end of data.
#[allow(clippy::used_underscore_binding)]
pub(crate) async fn fetch_loop<S: PageSource>(_worker_id: usize, worker: Worker<S>) -> WorkerExit {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    let exit = loop {
        let next = worker.requests.lock().await.recv().await;
        let Some(request) = next else {
            break WorkerExit::Drained;
        };

        if worker.done.is_past_end(request.offset()) {
            #[cfg(feature = "tracing")]
            tracing::trace!("Worker {_worker_id} refusing {request} past the end of data");
            break WorkerExit::Completed;
        }

        worker.stats.request_issued();
        match worker.fetch(request).await {
            Ok(page) if page.is_empty() => {
                worker.stats.empty_page();
                if worker.done.raise_at(request.offset()) {
                    worker.stats.completion_raised();
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {_worker_id} raised completion at {request}");
                }
                break WorkerExit::EmptyPage;
            }
            Ok(page) => {
                worker.stats.page_fetched();
                if worker.pages.send(Ok(page)).await.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {_worker_id} lost the gatherer");
                    break WorkerExit::Disconnected;
                }
            }
            Err(e) => {
                worker.stats.fetch_failed();
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker {_worker_id} stopping: {e}");

                // The run is failing; nothing past this point is worth fetching.
                if worker.error_policy == ErrorPolicy::FailFast {
                    if worker.done.raise_at(0) {
                        worker.stats.completion_raised();
                    }
                    if worker.pages.send(Err(e)).await.is_err() {
                        break WorkerExit::Disconnected;
                    }
                }
                break WorkerExit::Failed;
            }
        }
    };

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped: {exit:?}");
    exit
}

impl<S: PageSource> Worker<S> {
    async fn fetch(&self, request: PageRequest) -> Result<Vec<S::Item>> {
        let fetch = self.source.fetch_page(request);
        let fetched = match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .map_err(|_| Error::FetchTimeout { request, timeout })?,
            None => fetch.await,
        };
        fetched.map_err(|e| Error::FetchFailed {
            request,
            source: e.into(),
        })
    }
}
