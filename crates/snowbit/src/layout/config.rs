use core::fmt;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ConfigError, SnowflakeParts, SystemClock, TimeSource};

/// Usable width of an ID. Bit 63 is never set so IDs stay positive when
/// stored as signed 64-bit integers.
pub const ID_BITS: u8 = 63;

/// Upper bound on `timestamp_bits + node_id_bits`, leaving at least four
/// sequence bits.
pub const MAX_RESERVED_BITS: u8 = 59;

/// Narrowest accepted timestamp field: 2^40 ms is roughly 34 years.
pub const MIN_TIMESTAMP_BITS: u8 = 40;

/// Default epoch: Sunday, December 12, 2010 23:59:59 UTC
pub const DEFAULT_EPOCH: u64 = 1_292_198_399_000;

/// Default timestamp width: ~139 years of lifetime.
pub const DEFAULT_TIMESTAMP_BITS: u8 = 42;

/// Default node id width: 2048 nodes, leaving 10 sequence bits (1024 IDs per
/// millisecond per node).
pub const DEFAULT_NODE_ID_BITS: u8 = 11;

const MILLIS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// An immutable description of how a 64-bit ID is split into fields.
///
/// The layout is derived from three choices: the epoch timestamps are
/// measured from, the timestamp width and the node id width. The sequence
/// takes whatever remains of the 63 usable bits.
///
/// ```text
///  Bit Index:  63           63 62                 S+N S+N-1        S S-1           0
///              +--------------+---------------------+---------------+--------------+
///  Field:      | reserved (1) | timestamp (T)       | node id (N)   | sequence (S) |
///              +--------------+---------------------+---------------+--------------+
///              |<----------- MSB ------------- 64 bits ------------ LSB ----------->|
/// ```
///
/// `S = 63 - T - N` doubles as the shift applied to the node id.
///
/// # Example
///
/// ```
/// use snowbit::{DEFAULT_EPOCH, LayoutConfig};
///
/// let layout = LayoutConfig::new(DEFAULT_EPOCH, 42, 11).unwrap();
/// assert_eq!(layout.timestamp_shift(), 21);
/// assert_eq!(layout.sequence_bits(), 10);
/// assert_eq!(layout.max_sequence(), 1023);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutConfig {
    epoch: u64,
    timestamp_bits: u8,
    node_id_bits: u8,
}

impl LayoutConfig {
    /// Derives and validates a layout against the system clock.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EpochInFuture`] if `epoch` is not before now
    /// - [`ConfigError::TimestampWidthTooSmall`] if `timestamp_bits` is below
    ///   [`MIN_TIMESTAMP_BITS`]
    /// - [`ConfigError::FieldWidthOverflow`] if `timestamp_bits +
    ///   node_id_bits` exceeds [`MAX_RESERVED_BITS`]
    pub fn new(epoch: u64, timestamp_bits: u8, node_id_bits: u8) -> Result<Self, ConfigError> {
        Self::with_time(epoch, timestamp_bits, node_id_bits, &SystemClock)
    }

    /// Derives and validates a layout, reading "now" once from `time`.
    ///
    /// Checks run in order: epoch, timestamp width, combined width.
    ///
    /// # Errors
    ///
    /// See [`LayoutConfig::new`].
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(time)))]
    pub fn with_time<T: TimeSource>(
        epoch: u64,
        timestamp_bits: u8,
        node_id_bits: u8,
        time: &T,
    ) -> Result<Self, ConfigError> {
        let now = time.current_millis();
        if epoch >= now {
            return Err(ConfigError::EpochInFuture { epoch, now });
        }

        let config = Self::new_unchecked(epoch, timestamp_bits, node_id_bits);
        config.check_structure()?;
        Ok(config)
    }

    /// The default layout: [`DEFAULT_EPOCH`], [`DEFAULT_TIMESTAMP_BITS`] and
    /// [`DEFAULT_NODE_ID_BITS`].
    ///
    /// # Errors
    ///
    /// Only fails if the system clock reads earlier than the default epoch.
    pub fn try_default() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_EPOCH, DEFAULT_TIMESTAMP_BITS, DEFAULT_NODE_ID_BITS)
    }

    /// Builds a layout without any validation.
    ///
    /// Useful for `const` layouts. Generators re-check the structure when
    /// constructed and reject an unusable layout with
    /// [`ConfigError::InvalidConfig`].
    pub const fn new_unchecked(epoch: u64, timestamp_bits: u8, node_id_bits: u8) -> Self {
        Self {
            epoch,
            timestamp_bits,
            node_id_bits,
        }
    }

    /// Validates field widths, independent of the clock.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TimestampWidthTooSmall`] or
    /// [`ConfigError::FieldWidthOverflow`].
    pub fn check_structure(&self) -> Result<(), ConfigError> {
        if self.timestamp_bits < MIN_TIMESTAMP_BITS {
            return Err(ConfigError::TimestampWidthTooSmall {
                bits: self.timestamp_bits,
                min: MIN_TIMESTAMP_BITS,
            });
        }
        let reserved = u16::from(self.timestamp_bits) + u16::from(self.node_id_bits);
        if reserved > u16::from(MAX_RESERVED_BITS) {
            return Err(ConfigError::FieldWidthOverflow {
                bits: reserved,
                max: MAX_RESERVED_BITS,
            });
        }
        Ok(())
    }

    /// Milliseconds since the Unix epoch at which timestamps start.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub const fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    pub const fn node_id_bits(&self) -> u8 {
        self.node_id_bits
    }

    /// `63 - timestamp_bits`.
    pub const fn timestamp_shift(&self) -> u8 {
        ID_BITS.saturating_sub(self.timestamp_bits)
    }

    /// `63 - timestamp_bits - node_id_bits`. The sequence occupies the lowest
    /// `sequence_bits` bits.
    pub const fn sequence_bits(&self) -> u8 {
        self.timestamp_shift().saturating_sub(self.node_id_bits)
    }

    /// The node id sits directly above the sequence.
    pub const fn node_id_shift(&self) -> u8 {
        self.sequence_bits()
    }

    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits)
    }

    pub const fn max_node_id(&self) -> u64 {
        mask(self.node_id_bits)
    }

    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits())
    }

    /// Number of distinct node ids the layout can address.
    pub const fn node_capacity(&self) -> u64 {
        self.max_node_id().saturating_add(1)
    }

    /// IDs a single node can mint per millisecond.
    pub const fn ids_per_ms_per_node(&self) -> u64 {
        self.max_sequence() + 1
    }

    /// IDs all nodes together can mint per millisecond.
    pub const fn ids_per_ms_total(&self) -> u64 {
        mask(self.node_id_bits + self.sequence_bits()).saturating_add(1)
    }

    /// Years (of 365 days) until the timestamp field is exhausted.
    #[allow(clippy::cast_precision_loss)]
    pub fn lifetime_years(&self) -> f64 {
        (self.max_timestamp() as f64 + 1.0) / MILLIS_PER_YEAR
    }

    /// Packs the three fields into an ID.
    ///
    /// Each value is masked to its field width.
    pub const fn compose(&self, timestamp: u64, node_id: u64, sequence: u64) -> u64 {
        let timestamp = (timestamp & self.max_timestamp()) << self.timestamp_shift();
        let node_id = (node_id & self.max_node_id()) << self.node_id_shift();
        let sequence = sequence & self.max_sequence();
        timestamp | node_id | sequence
    }

    /// Splits an ID minted under this layout into its fields.
    ///
    /// ```
    /// use snowbit::{DEFAULT_EPOCH, LayoutConfig};
    ///
    /// let layout = LayoutConfig::new(DEFAULT_EPOCH, 42, 11).unwrap();
    /// let parts = layout.decompose(layout.compose(1000, 3, 7));
    /// assert_eq!((parts.timestamp, parts.node_id, parts.sequence), (1000, 3, 7));
    /// ```
    pub const fn decompose(&self, id: u64) -> SnowflakeParts {
        SnowflakeParts {
            timestamp: (id >> self.timestamp_shift()) & self.max_timestamp(),
            node_id: (id >> self.node_id_shift()) & self.max_node_id(),
            sequence: id & self.max_sequence(),
        }
    }

    /// Wall-clock time an ID was minted at, in milliseconds since the Unix
    /// epoch.
    pub const fn unix_millis(&self, id: u64) -> u64 {
        self.epoch.saturating_add(self.decompose(id).timestamp)
    }
}

/// Renders the layout as a two-row table: field widths, then lifetime and
/// throughput.
impl fmt::Display for LayoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Snowflake layout (64 bit id, epoch {})", self.epoch)?;
        writeln!(
            f,
            "| 1 bit unused | {} bit timestamp | {} bit node id | {} bit sequence |",
            self.timestamp_bits,
            self.node_id_bits,
            self.sequence_bits()
        )?;
        write!(
            f,
            "| {:.2} years of lifetime | {} ids/ms across {} nodes | {} ids/ms per node |",
            self.lifetime_years(),
            self.ids_per_ms_total(),
            self.node_capacity(),
            self.ids_per_ms_per_node()
        )
    }
}

const fn mask(bits: u8) -> u64 {
    match 1u64.checked_shl(bits as u32) {
        Some(v) => v - 1,
        None => u64::MAX,
    }
}
