use core::time::Duration;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: u64 = 1_288_834_974_657;

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: u64 = 1_420_070_400_000;

/// A wall-clock source reporting milliseconds since the Unix epoch.
///
/// Generators subtract their layout's epoch from this reading, so the source
/// itself is layout-agnostic. Swap in a mock to drive time by hand in tests.
///
/// # Example
///
/// ```
/// use snowbit::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since 1970-01-01 UTC.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// Blocks the calling thread for a duration.
///
/// Used by the blocking generator path to back off when the sequence for the
/// current millisecond is exhausted.
pub trait SleepProvider {
    fn sleep_for(&self, dur: Duration);
}

impl<S: SleepProvider + ?Sized> SleepProvider for &S {
    fn sleep_for(&self, dur: Duration) {
        (**self).sleep_for(dur);
    }
}

impl<S: SleepProvider + ?Sized> SleepProvider for Arc<S> {
    fn sleep_for(&self, dur: Duration) {
        (**self).sleep_for(dur);
    }
}

/// Reads `SystemTime::now()` on every call.
///
/// The reading follows wall-clock adjustments, including NTP steps backwards.
/// See [`MonotonicClock`] for a source that never regresses.
///
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// An implementation of [`SleepProvider`] using `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleep;

impl SleepProvider for ThreadSleep {
    fn sleep_for(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_well_known_epochs() {
        let now = SystemClock.current_millis();
        assert!(now > TWITTER_EPOCH);
        assert!(now > DISCORD_EPOCH);
    }

    #[test]
    fn thread_sleep_blocks_for_at_least_the_duration() {
        let start = std::time::Instant::now();
        ThreadSleep.sleep_for(Duration::from_millis(2));
        assert!(start.elapsed() >= Duration::from_millis(2));
    }
}
