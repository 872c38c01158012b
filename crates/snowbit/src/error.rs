use core::time::Duration;

/// A result type defaulting to the runtime [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors returned while deriving a [`LayoutConfig`] or constructing a
/// generator from one.
///
/// Every variant is raised synchronously by a constructor; no partially built
/// value is ever returned alongside it. Callers may retry with corrected
/// inputs.
///
/// [`LayoutConfig`]: crate::LayoutConfig
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The epoch is not strictly before the current wall-clock time.
    #[error("epoch must be in the past: epoch [{epoch}] is not before now [{now}]")]
    EpochInFuture { epoch: u64, now: u64 },

    /// The timestamp field is narrower than [`MIN_TIMESTAMP_BITS`].
    ///
    /// [`MIN_TIMESTAMP_BITS`]: crate::MIN_TIMESTAMP_BITS
    #[error("timestamp must be at least [{min}] bits wide to generate unique ids, got [{bits}]")]
    TimestampWidthTooSmall { bits: u8, min: u8 },

    /// Timestamp and node id together exceed [`MAX_RESERVED_BITS`].
    ///
    /// [`MAX_RESERVED_BITS`]: crate::MAX_RESERVED_BITS
    #[error("timestamp and node id can accommodate at most [{max}] bits, got [{bits}]")]
    FieldWidthOverflow { bits: u16, max: u8 },

    /// The layout handed to a generator was never validated and is
    /// structurally unusable (e.g. a zero-width timestamp).
    #[error("invalid layout config")]
    InvalidConfig,

    /// The node id does not fit in the layout's node id field.
    #[error("node id [{node_id}] can not be greater than [{max}] as per layout")]
    NodeIdOutOfRange { node_id: u64, max: u64 },
}

/// Errors a generator can report while minting an ID.
///
/// With the default clock policy, no exhaustion timeout and the `parking-lot`
/// feature enabled, only [`Error::TimestampOverflow`] is reachable, and only
/// once the layout's lifetime has run out.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A thread panicked while holding the generator lock.
    ///
    /// Not produced when the `parking-lot` feature is enabled, since those
    /// mutexes do not poison.
    #[error("generator lock poisoned")]
    LockPoisoned,

    /// The sequence for the current millisecond was exhausted and the clock
    /// did not move past it within the configured bound.
    #[error("sequence exhausted and clock did not advance within {waited:?}")]
    SequenceExhaustionTimeout { waited: Duration },

    /// The clock reads earlier than the last issued timestamp and the
    /// generator runs with [`ClockPolicy::Reject`].
    ///
    /// [`ClockPolicy::Reject`]: crate::ClockPolicy::Reject
    #[error("clock moved backwards: {behind} ms behind the last issued timestamp")]
    ClockMovedBackwards { behind: u64 },

    /// Elapsed time since the epoch no longer fits in the timestamp field.
    #[error("elapsed time [{elapsed}] ms exceeds the timestamp field maximum [{max}]")]
    TimestampOverflow { elapsed: u64, max: u64 },
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
// Convert all poisoned lock errors to a simplified `LockPoisoned`
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
