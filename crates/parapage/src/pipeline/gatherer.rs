use super::worker::PageResult;
use crate::{error::Error, stats::StatsRecorder};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What the gatherer hands back once the page channel closes.
#[derive(Debug)]
pub(crate) struct Gathered<T> {
    pub(crate) items: Vec<T>,
    /// First failure forwarded by a worker, in receipt order.
    pub(crate) error: Option<Error>,
}

/// Drains the page channel into one collection, in receipt order.
///
/// There is exactly one gatherer per run and it owns `items` by value, so no
/// lock guards the collection. Returns when every sender is gone.
pub(crate) async fn gather<T>(
    mut pages: mpsc::Receiver<PageResult<T>>,
    stats: Arc<StatsRecorder>,
) -> Gathered<T> {
    let mut items = Vec::new();
    let mut error = None;

    while let Some(page) = pages.recv().await {
        match page {
            Ok(mut page) => {
                stats.items_gathered(page.len());
                items.append(&mut page);
            }
            // Keep draining so no worker blocks on a full channel.
            Err(e) => {
                if error.is_none() {
                    error = Some(e);
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Gatherer collected {} items", items.len());

    Gathered { items, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PageRequest;

    #[tokio::test]
    async fn appends_in_receipt_order() {
        let (tx, rx) = mpsc::channel(4);
        let stats = Arc::new(StatsRecorder::default());
        let handle = tokio::spawn(gather(rx, Arc::clone(&stats)));

        tx.send(Ok(vec!['c', 'd'])).await.unwrap();
        tx.send(Ok(vec!['a'])).await.unwrap();
        tx.send(Ok(vec!['b', 'e', 'f'])).await.unwrap();
        drop(tx);

        let gathered = handle.await.unwrap();
        assert_eq!(gathered.items, vec!['c', 'd', 'a', 'b', 'e', 'f']);
        assert!(gathered.error.is_none());
        assert_eq!(stats.snapshot().items_gathered, 6);
    }

    #[tokio::test]
    async fn keeps_first_error_and_keeps_draining() {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(gather(rx, Arc::new(StatsRecorder::default())));

        tx.send(Err(Error::TaskFailed {
            context: "first".into(),
        }))
        .await
        .unwrap();
        tx.send(Ok(vec![1_u32])).await.unwrap();
        tx.send(Err(Error::FetchTimeout {
            request: PageRequest::new(0, 1),
            timeout: core::time::Duration::from_millis(1),
        }))
        .await
        .unwrap();
        tx.send(Ok(vec![2])).await.unwrap();
        drop(tx);

        let gathered = handle.await.unwrap();
        assert_eq!(gathered.items, vec![1, 2]);
        match gathered.error {
            Some(Error::TaskFailed { context }) => assert_eq!(context, "first"),
            other => panic!("expected the first error, got {other:?}"),
        }
    }
}
