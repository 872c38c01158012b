use core::{future::Future, time::Duration};

use crate::{IdGenStatus, IdGenerator, Result};

/// Extension trait for asynchronously generating IDs on the
/// [`tokio`](https://docs.rs/tokio) runtime.
///
/// Polls [`IdGenerator::try_poll_id`] and, while the current millisecond's
/// sequence is exhausted, awaits a tokio timer for the reported
/// `yield_for` instead of blocking a worker thread under the generator lock.
pub trait IdGeneratorAsyncTokioExt {
    /// Returns a future that resolves to the next available ID.
    ///
    /// # Errors
    ///
    /// This future may return an error if the underlying generator does.
    ///
    /// # Example
    ///
    /// ```
    /// use snowbit::{IdGeneratorAsyncTokioExt, LayoutConfig, LockSnowflakeGenerator};
    ///
    /// # tokio::runtime::Builder::new_multi_thread().enable_time().build().unwrap().block_on(async {
    /// let layout = LayoutConfig::try_default().unwrap();
    /// let generator = LockSnowflakeGenerator::new(layout, 1).unwrap();
    /// let id = generator.next_id_async().await.unwrap();
    /// assert_eq!(layout.decompose(id).node_id, 1);
    /// # });
    /// ```
    fn next_id_async(&self) -> impl Future<Output = Result<u64>>;
}

impl<G> IdGeneratorAsyncTokioExt for G
where
    G: IdGenerator + Sync,
{
    fn next_id_async(&self) -> impl Future<Output = Result<u64>> {
        async {
            loop {
                let dur = match self.try_poll_id()? {
                    IdGenStatus::Ready { id } => return Ok(id),
                    IdGenStatus::Pending { yield_for } => Duration::from_millis(yield_for),
                };
                tokio::time::sleep(dur).await;
            }
        }
    }
}
