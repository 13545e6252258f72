//! One-shot completion broadcast shared by the generator and the workers.
//!
//! Any worker that sees the end of the data raises the signal. The first raise
//! wins: it flips an atomic guard and cancels the underlying
//! [`CancellationToken`]; every later raise, from any clone, is a no-op.
//!
//! Alongside the flag the signal keeps the lowest offset known to hold no
//! data. Workers may drop requests at or past that boundary, but must still
//! fetch anything below it: a request can be taken off the channel before the
//! signal is raised and inspected after.

use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cloneable handle to a run's completion state.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    token: CancellationToken,
    raised: Arc<AtomicBool>,
    boundary: Arc<AtomicUsize>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self {
            token: CancellationToken::new(),
            raised: Arc::new(AtomicBool::new(false)),
            boundary: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal. Returns `true` only for the call that took effect.
    pub fn raise(&self) -> bool {
        if self
            .raised
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Records that nothing exists at or past `offset`, then raises.
    ///
    /// The boundary only ever moves down, whichever raise took effect.
    pub fn raise_at(&self, offset: usize) -> bool {
        self.boundary.fetch_min(offset, Ordering::AcqRel);
        self.raise()
    }

    /// Non-blocking check.
    pub fn is_raised(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True if `offset` lies at or past a recorded end of data.
    pub fn is_past_end(&self, offset: usize) -> bool {
        offset >= self.boundary.load(Ordering::Acquire)
    }

    /// Resolves once the signal has been raised.
    pub async fn raised(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::sync::Barrier;
    use std::thread::scope;

    #[test]
    fn first_raise_wins() {
        let signal = CompletionSignal::new();
        assert!(!signal.is_raised());
        assert!(signal.raise());
        assert!(signal.is_raised());
        assert!(!signal.raise());
        assert!(!signal.clone().raise());
    }

    #[test]
    fn concurrent_raise_takes_effect_once() {
        const THREADS: usize = 16;

        for _ in 0..100 {
            let signal = CompletionSignal::new();
            let barrier = Barrier::new(THREADS);
            let winners = AtomicUsize::new(0);

            scope(|s| {
                for i in 0..THREADS {
                    let signal = signal.clone();
                    let barrier = &barrier;
                    let winners = &winners;
                    s.spawn(move || {
                        barrier.wait();
                        if signal.raise_at(100 + i) {
                            winners.fetch_add(1, Ordering::Relaxed);
                        }
                    });
                }
            });

            assert_eq!(winners.load(Ordering::Relaxed), 1);
            assert!(signal.is_raised());
            assert!(signal.is_past_end(100));
            assert!(!signal.is_past_end(99));
        }
    }

    #[test]
    fn boundary_only_moves_down() {
        let signal = CompletionSignal::new();
        assert!(!signal.is_past_end(usize::MAX - 1));

        assert!(signal.raise_at(40));
        assert!(!signal.raise_at(60));
        assert!(signal.is_past_end(40));
        assert!(!signal.is_past_end(39));

        assert!(!signal.raise_at(12));
        assert!(signal.is_past_end(12));
        assert!(!signal.is_past_end(11));
    }

    #[test]
    fn plain_raise_records_no_boundary() {
        let signal = CompletionSignal::new();
        signal.raise();
        assert!(signal.is_raised());
        assert!(!signal.is_past_end(1_000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn waiters_wake_on_raise() {
        let signal = CompletionSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.raised().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        signal.raise();

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter never woke")
            .unwrap();
    }
}
