/// How a generator reacts when the clock reads earlier than the timestamp of
/// the last ID it issued.
///
/// Wall clocks can step backwards (NTP corrections, manual changes, VM
/// migration). None of the policies detect a regression that happens across a
/// restart.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockPolicy {
    /// Use the regressed reading as-is and keep counting the sequence.
    ///
    /// The smaller reading becomes the new last timestamp, so later readings
    /// that are still behind the earlier high point look like forward
    /// progress and reset the sequence. A `(timestamp, sequence)` pair issued
    /// before the regression can then be issued again.
    #[default]
    Follow,

    /// Treat a regressed reading as the last issued timestamp.
    ///
    /// IDs keep sharing the last timestamp until its sequence runs out, at
    /// which point the generator waits for the clock to catch up.
    HighWaterMark,

    /// Refuse to mint IDs while the clock is behind, returning
    /// [`Error::ClockMovedBackwards`].
    ///
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    Reject,
}
