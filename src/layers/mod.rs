//! Layer variants, the wrapper that unifies them and the keyed registry.

pub mod base;
pub mod factory;
pub mod image;
pub mod manager;
pub mod style;
pub mod tile;
pub mod vector;
pub mod vector_tile;
pub mod wrapper;

use futures::future::BoxFuture;

use crate::Result;

/// A value that is either at hand or still arriving.
///
/// Registry operations that accept data take a `Pending` so callers can hand
/// over the future of a fetch without awaiting it themselves.
pub enum Pending<T> {
    Ready(T),
    Future(BoxFuture<'static, Result<T>>),
}

impl<T> Pending<T> {
    pub fn from_future<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<T>> + Send + 'static,
    {
        Pending::Future(Box::pin(future))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Pending::Ready(_))
    }

    pub async fn resolve(self) -> Result<T> {
        match self {
            Pending::Ready(value) => Ok(value),
            Pending::Future(future) => future.await,
        }
    }
}

impl<T> From<T> for Pending<T> {
    fn from(value: T) -> Self {
        Pending::Ready(value)
    }
}

impl<T> std::fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pending::Ready(_) => f.write_str("Pending::Ready(..)"),
            Pending::Future(_) => f.write_str("Pending::Future(..)"),
        }
    }
}
