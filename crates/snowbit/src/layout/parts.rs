use core::fmt;

/// The decoded fields of an ID, as returned by [`LayoutConfig::decompose`].
///
/// [`LayoutConfig::decompose`]: crate::LayoutConfig::decompose
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeParts {
    /// Milliseconds since the layout's epoch.
    pub timestamp: u64,
    pub node_id: u64,
    /// Position of the ID within its millisecond on its node.
    pub sequence: u64,
}

impl fmt::Display for SnowflakeParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp={} node_id={} sequence={}",
            self.timestamp, self.node_id, self.sequence
        )
    }
}
