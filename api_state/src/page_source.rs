use std::future::Future;

use async_trait::async_trait;

use crate::{Page, RequestError};

/// A backend that serves a collection one page at a time.
///
/// Implemented for every `Fn(page, limit) -> Future<Output = Result<Page<T>, E>>`,
/// so plain async closures can be used as sources.
#[async_trait(?Send)]
pub trait PageSource<T> {
    /// Fetch page number `page`, holding at most `limit` items.
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<T>, RequestError>;
}

#[async_trait(?Send)]
impl<T, F, Fu, E> PageSource<T> for F
where
    T: 'static,
    F: Fn(u32, u32) -> Fu,
    Fu: Future<Output = Result<Page<T>, E>> + 'static,
    E: Into<RequestError> + 'static,
{
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<T>, RequestError> {
        self(page, limit).await.map_err(Into::into)
    }
}
