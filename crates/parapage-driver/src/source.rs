use core::time::Duration;
use parapage::{PageRequest, PageSource};
use portable_atomic::{AtomicU64, Ordering};

/// An item served by the simulated endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Record {
    pub id: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("Simulated endpoint failed for {request} (poisoned item {index})")]
pub struct SimulatedError {
    pub request: PageRequest,
    pub index: usize,
}

/// In-memory stand-in for a remote offset/limit list endpoint.
///
/// Holds `total_items` records with ids `0..total_items`, answers each call
/// after `latency`, and fails any request whose range covers `fail_at`.
#[derive(Debug)]
pub struct SimulatedSource {
    total_items: usize,
    latency: Duration,
    fail_at: Option<usize>,
    calls: AtomicU64,
}

impl SimulatedSource {
    pub const fn new(total_items: usize, latency: Duration, fail_at: Option<usize>) -> Self {
        Self {
            total_items,
            latency,
            fail_at,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of `fetch_page` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn page(&self, request: PageRequest) -> Result<Vec<Record>, SimulatedError> {
        let start = request.offset().min(self.total_items);
        let end = request
            .offset()
            .saturating_add(request.limit())
            .min(self.total_items);

        if let Some(index) = self.fail_at.filter(|i| (start..end).contains(i)) {
            return Err(SimulatedError { request, index });
        }

        Ok((start..end).map(|id| Record { id: id as u64 }).collect())
    }
}

impl PageSource for SimulatedSource {
    type Item = Record;
    type Error = SimulatedError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Record>, SimulatedError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.page(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn serves_pages_until_it_runs_dry() {
        let source = SimulatedSource::new(10, Duration::ZERO, None);

        let page = source.fetch_page(PageRequest::new(4, 4)).await.unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), [4, 5, 6, 7]);

        let page = source.fetch_page(PageRequest::new(8, 4)).await.unwrap();
        assert_eq!(page.len(), 2);

        assert!(
            source
                .fetch_page(PageRequest::new(12, 4))
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fails_requests_covering_the_poisoned_item() {
        let source = SimulatedSource::new(100, Duration::ZERO, Some(42));

        assert!(source.fetch_page(PageRequest::new(0, 40)).await.is_ok());
        let err = source
            .fetch_page(PageRequest::new(40, 10))
            .await
            .unwrap_err();
        assert_eq!(err.index, 42);
        assert_eq!(err.request, PageRequest::new(40, 10));
        assert!(source.fetch_page(PageRequest::new(43, 10)).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn huge_limits_do_not_overflow() {
        let source = SimulatedSource::new(3, Duration::ZERO, None);
        let page = source
            .fetch_page(PageRequest::new(1, usize::MAX))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }
}
