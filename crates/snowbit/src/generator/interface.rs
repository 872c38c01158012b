use crate::{IdGenStatus, Result};

/// The outward "get next unique id" interface.
///
/// Implementors hand out 64-bit IDs that are unique for as long as no other
/// live generator shares their node id.
pub trait IdGenerator {
    /// Returns the next ID, blocking while the current millisecond's sequence
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// Implementation-specific; see [`Error`](crate::Error).
    fn next_id(&self) -> Result<u64>;

    /// Attempts to return the next ID without blocking.
    ///
    /// # Errors
    ///
    /// Implementation-specific; see [`Error`](crate::Error).
    fn try_poll_id(&self) -> Result<IdGenStatus>;
}
