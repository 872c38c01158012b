/// Represents the result of polling a generator for a new ID.
///
/// This type models the outcome of [`IdGenerator::try_poll_id`]:
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the sequence for the current millisecond
///   is exhausted and the caller should back off before polling again.
///
/// Unlike [`IdGenerator::next_id`], polling never sleeps while holding the
/// generator lock, so the back-off happens outside the critical section.
///
/// # Example
///
/// ```
/// use snowbit::{IdGenStatus, IdGenerator, LayoutConfig, LockSnowflakeGenerator};
///
/// let layout = LayoutConfig::try_default().unwrap();
/// let generator = LockSnowflakeGenerator::new(layout, 1).unwrap();
///
/// let id = loop {
///     match generator.try_poll_id().unwrap() {
///         IdGenStatus::Ready { id } => break id,
///         IdGenStatus::Pending { yield_for } => {
///             std::thread::sleep(std::time::Duration::from_millis(yield_for));
///         }
///     }
/// };
/// assert_eq!(layout.decompose(id).node_id, 1);
/// ```
///
/// [`IdGenerator::try_poll_id`]: crate::IdGenerator::try_poll_id
/// [`IdGenerator::next_id`]: crate::IdGenerator::next_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: u64,
    },
    /// No ID could be generated for the current millisecond.
    Pending {
        /// Milliseconds to wait before polling again.
        yield_for: u64,
    },
}
