use portable_atomic::{AtomicU64, Ordering};

/// Counters collected over one [`Paginator`](crate::Paginator) run.
///
/// `requests_issued` counts requests handed to the source, so
/// `requests_issued == pages_fetched + empty_pages + fetch_failures` once the
/// run has finished. `completion_raises` is at most one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub requests_issued: u64,
    pub pages_fetched: u64,
    pub empty_pages: u64,
    pub fetch_failures: u64,
    pub items_gathered: u64,
    pub completion_raises: u64,
}

/// Lock-free recorder shared by the pipeline tasks.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    requests_issued: AtomicU64,
    pages_fetched: AtomicU64,
    empty_pages: AtomicU64,
    fetch_failures: AtomicU64,
    items_gathered: AtomicU64,
    completion_raises: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn request_issued(&self) {
        self.requests_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn empty_page(&self) {
        self.empty_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn items_gathered(&self, count: usize) {
        self.items_gathered.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn completion_raised(&self) {
        self.completion_raises.fetch_add(1, Ordering::Relaxed);
    }

    /// Only meaningful after every task has been joined.
    pub(crate) fn snapshot(&self) -> FetchStats {
        FetchStats {
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            empty_pages: self.empty_pages.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            items_gathered: self.items_gathered.load(Ordering::Relaxed),
            completion_raises: self.completion_raises.load(Ordering::Relaxed),
        }
    }
}
