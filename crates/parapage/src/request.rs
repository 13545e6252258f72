use core::{fmt, num::NonZeroUsize};

/// One unit of fetch work: the `(offset, limit)` pair handed to a
/// [`PageSource`](crate::PageSource).
///
/// Requests are produced by the option generator and are immutable once
/// emitted. Each one is consumed by exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageRequest {
    offset: usize,
    limit: usize,
}

impl PageRequest {
    pub const fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Index of the first item requested.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Maximum number of items requested.
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset={} limit={}", self.offset, self.limit)
    }
}

/// What the caller asked [`Paginator::list_all`](crate::Paginator::list_all)
/// for.
///
/// A `limit` of zero means "everything from `offset` until the source runs
/// dry".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub offset: usize,
    pub limit: usize,
}

impl ListOptions {
    /// Fetch every item, starting at the first one.
    pub const fn all() -> Self {
        Self {
            offset: 0,
            limit: 0,
        }
    }

    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) const fn budget(&self) -> FetchBudget {
        FetchBudget::from_limit(self.limit)
    }
}

/// Remaining number of items the generator may still schedule.
///
/// Only the generator mutates a budget, and it never grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBudget {
    /// Keep scheduling until the source returns an empty page.
    Unbounded,
    /// Schedule at most this many more items.
    Bounded(usize),
}

impl FetchBudget {
    /// Maps a caller limit onto a budget; `0` means unbounded.
    pub const fn from_limit(limit: usize) -> Self {
        if limit == 0 {
            Self::Unbounded
        } else {
            Self::Bounded(limit)
        }
    }

    /// Reserves the limit for the next request: `min(rate, remaining)`.
    pub fn take(&mut self, rate: NonZeroUsize) -> usize {
        match self {
            Self::Unbounded => rate.get(),
            Self::Bounded(remaining) => {
                let limit = rate.get().min(*remaining);
                *remaining -= limit;
                limit
            }
        }
    }

    /// True once a bounded budget has been fully scheduled. Never true for
    /// [`FetchBudget::Unbounded`].
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Bounded(0))
    }
}
