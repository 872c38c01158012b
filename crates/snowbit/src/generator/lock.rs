use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    ClockPolicy, ConfigError, Error, IdGenStatus, IdGenerator, LayoutConfig, Result,
    SleepProvider, SystemClock, ThreadSleep, TimeSource,
    generator::{Mutex, MutexGuard},
};

/// How long the blocking path sleeps between clock reads once the sequence
/// for the current millisecond is exhausted.
pub const EXHAUSTION_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GeneratorState {
    /// Elapsed millis since the epoch of the last minted ID.
    last_timestamp: u64,
    /// Sequence of the last minted ID.
    sequence: u64,
}

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// One generator owns one node id. Its `(last_timestamp, sequence)` state sits
/// behind a single mutex that covers the whole read-modify-write of
/// [`next_id`], including the back-off sleep when a millisecond's sequence
/// runs out. Every other caller queues behind that sleep; use
/// [`try_poll_id`] to back off outside the lock instead.
///
/// Share it across threads with an `Arc` or a scoped borrow.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Any layout accepted by [`LayoutConfig`]
/// - ✅ Pluggable [`TimeSource`] and [`SleepProvider`] for tests
///
/// [`next_id`]: LockSnowflakeGenerator::next_id
/// [`try_poll_id`]: LockSnowflakeGenerator::try_poll_id
#[derive(Debug)]
pub struct LockSnowflakeGenerator<T = SystemClock, S = ThreadSleep>
where
    T: TimeSource,
    S: SleepProvider,
{
    state: Mutex<GeneratorState>,
    config: LayoutConfig,
    node_id: u64,
    policy: ClockPolicy,
    exhaustion_timeout: Option<Duration>,
    time: T,
    sleep: S,
}

impl LockSnowflakeGenerator {
    /// Creates a generator for `node_id` reading the system clock.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidConfig`] if `config` is structurally invalid
    /// - [`ConfigError::NodeIdOutOfRange`] if `node_id` does not fit in the
    ///   layout's node id field
    ///
    /// # Example
    /// ```
    /// use snowbit::{LayoutConfig, LockSnowflakeGenerator};
    ///
    /// let layout = LayoutConfig::try_default().unwrap();
    /// let generator = LockSnowflakeGenerator::new(layout, 7).unwrap();
    ///
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(b > a);
    /// ```
    pub fn new(config: LayoutConfig, node_id: u64) -> Result<Self, ConfigError> {
        Self::with_time(config, node_id, SystemClock, ThreadSleep)
    }
}

impl<T, S> LockSnowflakeGenerator<T, S>
where
    T: TimeSource,
    S: SleepProvider,
{
    /// Creates a generator with an explicit time source and sleep provider.
    ///
    /// # Errors
    ///
    /// See [`LockSnowflakeGenerator::new`].
    pub fn with_time(
        config: LayoutConfig,
        node_id: u64,
        time: T,
        sleep: S,
    ) -> Result<Self, ConfigError> {
        Self::from_components(config, node_id, 0, 0, time, sleep)
    }

    /// Creates a generator preloaded with explicit state.
    ///
    /// `last_timestamp` is in milliseconds since the layout's epoch. Primarily
    /// useful for restoring state saved elsewhere, or to start a generator
    /// right at the edge of its sequence.
    ///
    /// # Errors
    ///
    /// See [`LockSnowflakeGenerator::new`].
    pub fn from_components(
        config: LayoutConfig,
        node_id: u64,
        last_timestamp: u64,
        sequence: u64,
        time: T,
        sleep: S,
    ) -> Result<Self, ConfigError> {
        config
            .check_structure()
            .map_err(|_| ConfigError::InvalidConfig)?;

        let max = config.max_node_id();
        if node_id > max {
            return Err(ConfigError::NodeIdOutOfRange { node_id, max });
        }

        Ok(Self {
            state: Mutex::new(GeneratorState {
                last_timestamp,
                sequence,
            }),
            config,
            node_id,
            policy: ClockPolicy::default(),
            exhaustion_timeout: None,
            time,
            sleep,
        })
    }

    /// Sets how the generator reacts to the clock moving backwards.
    #[must_use]
    pub fn with_clock_policy(mut self, policy: ClockPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bounds how long [`next_id`] may wait for the clock after exhausting a
    /// millisecond's sequence.
    ///
    /// The wait is measured in [`EXHAUSTION_BACKOFF`] intervals slept, so an
    /// oversleeping host only ever makes the bound more lenient.
    ///
    /// [`next_id`]: LockSnowflakeGenerator::next_id
    #[must_use]
    pub fn with_exhaustion_timeout(mut self, timeout: Duration) -> Self {
        self.exhaustion_timeout = Some(timeout);
        self
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn clock_policy(&self) -> ClockPolicy {
        self.policy
    }

    /// Generates the next ID, sleeping under the lock if the current
    /// millisecond's sequence is exhausted.
    ///
    /// # Errors
    /// - [`Error::LockPoisoned`] if a thread panicked holding the lock
    /// - [`Error::ClockMovedBackwards`] under [`ClockPolicy::Reject`]
    /// - [`Error::SequenceExhaustionTimeout`] if an exhaustion timeout is set
    ///   and the clock stalls past it
    /// - [`Error::TimestampOverflow`] once the layout's lifetime is over
    ///
    /// State is left untouched whenever an error is returned.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        let mut state = self.lock()?;

        let mut timestamp = self.elapsed();
        let last = state.last_timestamp;
        if timestamp > last {
            return self.commit(&mut state, timestamp, 0);
        }

        if timestamp < last {
            timestamp = self.cold_clock_behind(timestamp, last)?;
        }

        if state.sequence < self.config.max_sequence() {
            let sequence = state.sequence + 1;
            self.commit(&mut state, timestamp, sequence)
        } else {
            let timestamp = self.cold_wait_for_next_millis(timestamp)?;
            self.commit(&mut state, timestamp, 0)
        }
    }

    /// Attempts to generate the next ID without sleeping.
    ///
    /// Returns [`IdGenStatus::Pending`] when the sequence is exhausted, with
    /// the number of milliseconds until the clock passes the last issued
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`LockSnowflakeGenerator::next_id`], minus the timeout.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let mut state = self.lock()?;

        let now = self.elapsed();
        let last = state.last_timestamp;
        if now > last {
            let id = self.commit(&mut state, now, 0)?;
            return Ok(IdGenStatus::Ready { id });
        }

        let timestamp = if now < last {
            self.cold_clock_behind(now, last)?
        } else {
            now
        };

        if state.sequence < self.config.max_sequence() {
            let sequence = state.sequence + 1;
            let id = self.commit(&mut state, timestamp, sequence)?;
            Ok(IdGenStatus::Ready { id })
        } else {
            Ok(IdGenStatus::Pending {
                yield_for: last - now + 1,
            })
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, GeneratorState>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    fn elapsed(&self) -> u64 {
        self.time
            .current_millis()
            .saturating_sub(self.config.epoch())
    }

    fn commit(&self, state: &mut GeneratorState, timestamp: u64, sequence: u64) -> Result<u64> {
        let max = self.config.max_timestamp();
        if timestamp > max {
            return Err(Error::TimestampOverflow {
                elapsed: timestamp,
                max,
            });
        }

        state.last_timestamp = timestamp;
        state.sequence = sequence;
        Ok(self.config.compose(timestamp, self.node_id, sequence))
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64, last: u64) -> Result<u64> {
        let behind = last - now;
        #[cfg(feature = "tracing")]
        tracing::warn!(behind, policy = ?self.policy, "clock moved backwards");

        match self.policy {
            ClockPolicy::Follow => Ok(now),
            ClockPolicy::HighWaterMark => Ok(last),
            ClockPolicy::Reject => Err(Error::ClockMovedBackwards { behind }),
        }
    }

    /// Sleeps in [`EXHAUSTION_BACKOFF`] steps until the clock reads past
    /// `exhausted`, returning the new reading.
    #[cold]
    #[inline(never)]
    fn cold_wait_for_next_millis(&self, exhausted: u64) -> Result<u64> {
        #[cfg(feature = "tracing")]
        tracing::debug!(timestamp = exhausted, "sequence exhausted, waiting for the clock");

        let mut waited = Duration::ZERO;
        loop {
            self.sleep.sleep_for(EXHAUSTION_BACKOFF);
            waited += EXHAUSTION_BACKOFF;

            let now = self.elapsed();
            if now > exhausted {
                return Ok(now);
            }

            if self.exhaustion_timeout.is_some_and(|limit| waited >= limit) {
                #[cfg(feature = "tracing")]
                tracing::error!(?waited, "clock stalled while sequence exhausted");
                return Err(Error::SequenceExhaustionTimeout { waited });
            }
        }
    }
}

impl<T, S> IdGenerator for LockSnowflakeGenerator<T, S>
where
    T: TimeSource,
    S: SleepProvider,
{
    fn next_id(&self) -> Result<u64> {
        LockSnowflakeGenerator::next_id(self)
    }

    fn try_poll_id(&self) -> Result<IdGenStatus> {
        LockSnowflakeGenerator::try_poll_id(self)
    }
}
