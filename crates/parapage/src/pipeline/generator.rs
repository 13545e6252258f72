use crate::{
    request::{ListOptions, PageRequest},
    signal::CompletionSignal,
};
use core::num::NonZeroUsize;
use tokio::sync::mpsc;

/// Emits [`PageRequest`]s with strictly increasing offsets until the budget
/// is spent, the completion signal is raised, or no worker is left to
/// receive.
///
/// Each request asks for `min(fetch_rate, remaining)` items and the offset
/// advances by `fetch_rate`. Dropping `tx` on return closes the request
/// channel, which is how workers learn that no more work is coming.
///
/// Returns the number of requests handed to the channel.
pub(crate) async fn generate_requests(
    options: ListOptions,
    fetch_rate: NonZeroUsize,
    tx: mpsc::Sender<PageRequest>,
    done: CompletionSignal,
) -> usize {
    #[cfg(feature = "tracing")]
    tracing::trace!("Generator started at offset {}", options.offset);

    let mut budget = options.budget();
    let mut offset = options.offset;
    let mut emitted = 0;

    loop {
        let request = PageRequest::new(offset, budget.take(fetch_rate));

        tokio::select! {
            biased;
            () = done.raised() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Generator observed completion before {request}");
                break;
            }
            sent = tx.send(request) => {
                if sent.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Generator stopping: every worker has exited");
                    break;
                }
                emitted += 1;
            }
        }

        if budget.is_exhausted() {
            break;
        }

        match offset.checked_add(fetch_rate.get()) {
            Some(next) => offset = next,
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Generator stopping: offset space exhausted after {request}");
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Generator stopped after {emitted} requests");

    emitted
}
