use crate::{error::BoxError, request::PageRequest};
use core::future::Future;
use std::sync::Arc;

/// The remote list endpoint being paginated.
///
/// A source answers one [`PageRequest`] at a time with up to
/// `request.limit()` items starting at `request.offset()`. An empty page means
/// there is nothing at or past that offset and ends the run.
///
/// `fetch_page` takes `&self` and is called concurrently from every worker, so
/// implementations must not rely on exclusive access between calls. Retries,
/// authentication and transport concerns belong to the implementation.
pub trait PageSource: Send + Sync + 'static {
    /// The listed entity. Opaque to the paginator.
    type Item: Send + 'static;

    /// Error returned by a failed fetch.
    type Error: Into<BoxError> + Send + 'static;

    /// Fetches the page described by `request`.
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Vec<Self::Item>, Self::Error>> + Send;
}

impl<S> PageSource for Arc<S>
where
    S: PageSource,
{
    type Item = S::Item;
    type Error = S::Error;

    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Vec<Self::Item>, Self::Error>> + Send {
        S::fetch_page(self, request)
    }
}

/// A [`PageSource`] backed by a closure. Created with [`from_fn`].
#[derive(Clone)]
pub struct FnSource<F> {
    f: F,
}

/// Wraps an async closure as a [`PageSource`].
///
/// # Example
/// ```
/// use parapage::{ListOptions, PageRequest, Paginator, PaginatorConfig, from_fn};
///
/// # tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap().block_on(async {
/// let source = from_fn(|req: PageRequest| async move {
///     let end = (req.offset() + req.limit()).min(10);
///     Ok::<_, std::io::Error>((req.offset()..end).collect::<Vec<_>>())
/// });
///
/// let paginator = Paginator::new(source, PaginatorConfig::default().with_fetch_rate(3));
/// let mut items = paginator.list_all(ListOptions::all()).await.unwrap();
/// items.sort_unstable();
/// assert_eq!(items, (0..10).collect::<Vec<_>>());
/// # });
/// ```
pub const fn from_fn<F>(f: F) -> FnSource<F> {
    FnSource { f }
}

impl<F, Fut, T, E> PageSource for FnSource<F>
where
    F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, E>> + Send,
    T: Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    type Item = T;
    type Error = E;

    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Vec<Self::Item>, Self::Error>> + Send {
        (self.f)(request)
    }
}
