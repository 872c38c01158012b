use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::{ops::Range, time::Duration};
use snowbit::{
    ClockPolicy, DEFAULT_EPOCH, DEFAULT_NODE_ID_BITS, DEFAULT_TIMESTAMP_BITS, LayoutConfig,
};

/// Runtime configuration for the `snowbit-demo` binary.
///
/// Every value is parsed from CLI arguments or environment variables. The
/// defaults reproduce the classic layout: 42 timestamp bits and 11 node id
/// bits, leaving a 10 bit sequence.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowbit-demo",
    version,
    about = "Mint Snowflake-style IDs from concurrent consumers and audit them"
)]
pub struct CliArgs {
    /// Milliseconds since the Unix epoch that timestamps are measured from.
    ///
    /// Must be in the past.
    ///
    /// Environment variable: `SNOWBIT_EPOCH`
    #[arg(long, env = "SNOWBIT_EPOCH", default_value_t = DEFAULT_EPOCH)]
    pub epoch: u64,

    /// Width of the timestamp field, at least 40.
    ///
    /// Environment variable: `SNOWBIT_TIMESTAMP_BITS`
    #[arg(long, env = "SNOWBIT_TIMESTAMP_BITS", default_value_t = DEFAULT_TIMESTAMP_BITS)]
    pub timestamp_bits: u8,

    /// Width of the node id field. Together with the timestamp it may take at
    /// most 59 bits.
    ///
    /// Environment variable: `SNOWBIT_NODE_ID_BITS`
    #[arg(long, env = "SNOWBIT_NODE_ID_BITS", default_value_t = DEFAULT_NODE_ID_BITS)]
    pub node_id_bits: u8,

    /// Number of generators to run, one per node id.
    ///
    /// Environment variable: `SNOWBIT_NODES`
    #[arg(long, env = "SNOWBIT_NODES", default_value_t = 1)]
    pub nodes: u64,

    /// First node id handed out. Node ids run from `node_offset` to
    /// `node_offset + nodes - 1` and must all fit the layout.
    ///
    /// Environment variable: `SNOWBIT_NODE_OFFSET`
    #[arg(long, env = "SNOWBIT_NODE_OFFSET", default_value_t = 0)]
    pub node_offset: u64,

    /// Consumer threads sharing each generator.
    ///
    /// Environment variable: `SNOWBIT_CONSUMERS`
    #[arg(long, env = "SNOWBIT_CONSUMERS", default_value_t = 3)]
    pub consumers: usize,

    /// IDs requested by each consumer.
    ///
    /// Environment variable: `SNOWBIT_IDS_PER_CONSUMER`
    #[arg(long, env = "SNOWBIT_IDS_PER_CONSUMER", default_value_t = 100)]
    pub ids_per_consumer: usize,

    /// Time source the generators read.
    ///
    /// Environment variable: `SNOWBIT_CLOCK`
    #[arg(long, env = "SNOWBIT_CLOCK", value_enum, default_value_t = ClockKind::System)]
    pub clock: ClockKind,

    /// Reaction to the clock reading earlier than the last issued timestamp.
    ///
    /// Environment variable: `SNOWBIT_CLOCK_POLICY`
    #[arg(long, env = "SNOWBIT_CLOCK_POLICY", value_enum, default_value_t = PolicyArg::Follow)]
    pub clock_policy: PolicyArg,

    /// Give up waiting for the clock after this many milliseconds once a
    /// millisecond's sequence is exhausted. Waits forever when unset.
    ///
    /// Environment variable: `SNOWBIT_EXHAUSTION_TIMEOUT_MS`
    #[arg(long, env = "SNOWBIT_EXHAUSTION_TIMEOUT_MS")]
    pub exhaustion_timeout_ms: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Wall clock, read on every call.
    System,
    /// Wall clock sampled once, then advanced monotonically.
    Monotonic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    Follow,
    HighWaterMark,
    Reject,
}

impl From<PolicyArg> for ClockPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Follow => Self::Follow,
            PolicyArg::HighWaterMark => Self::HighWaterMark,
            PolicyArg::Reject => Self::Reject,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub layout: LayoutConfig,
    pub nodes: u64,
    pub node_offset: u64,
    pub consumers: usize,
    pub ids_per_consumer: usize,
    pub clock: ClockKind,
    pub clock_policy: ClockPolicy,
    pub exhaustion_timeout: Option<Duration>,
    /// `nodes * consumers * ids_per_consumer`, checked at construction.
    pub total_ids: usize,
}

impl DemoConfig {
    /// Node ids assigned to the generators, in order.
    pub fn node_ids(&self) -> Range<u64> {
        self.node_offset..self.node_offset + self.nodes
    }
}

impl TryFrom<CliArgs> for DemoConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let layout = LayoutConfig::new(args.epoch, args.timestamp_bits, args.node_id_bits)?;

        if args.nodes == 0 {
            bail!("SNOWBIT_NODES must be greater than 0");
        }

        if args.consumers == 0 {
            bail!("SNOWBIT_CONSUMERS must be greater than 0");
        }

        let last_node_id = args
            .node_offset
            .checked_add(args.nodes - 1)
            .ok_or_else(|| anyhow::anyhow!("Overflow in node id range computation"))?;
        if last_node_id > layout.max_node_id() {
            bail!(
                "node ids {}..={} exceed the layout's node id space (max = {})",
                args.node_offset,
                last_node_id,
                layout.max_node_id()
            );
        }

        let total_ids = usize::try_from(args.nodes)
            .ok()
            .and_then(|nodes| nodes.checked_mul(args.consumers))
            .and_then(|consumers| consumers.checked_mul(args.ids_per_consumer))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Overflow in total id computation ({} nodes x {} consumers x {} ids)",
                    args.nodes,
                    args.consumers,
                    args.ids_per_consumer
                )
            })?;

        Ok(Self {
            layout,
            nodes: args.nodes,
            node_offset: args.node_offset,
            consumers: args.consumers,
            ids_per_consumer: args.ids_per_consumer,
            clock: args.clock,
            clock_policy: args.clock_policy.into(),
            exhaustion_timeout: args.exhaustion_timeout_ms.map(Duration::from_millis),
            total_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowbit::ConfigError;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("snowbit-demo").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_build_the_classic_layout() {
        let config = DemoConfig::try_from(parse(&[])).unwrap();
        assert_eq!(config.layout, LayoutConfig::try_default().unwrap());
        assert_eq!(config.nodes, 1);
        assert_eq!(config.consumers, 3);
        assert_eq!(config.ids_per_consumer, 100);
        assert_eq!(config.clock, ClockKind::System);
        assert_eq!(config.clock_policy, ClockPolicy::Follow);
        assert_eq!(config.exhaustion_timeout, None);
        assert_eq!(config.total_ids, 300);
    }

    #[test]
    fn parses_enums_and_timeout() {
        let config = DemoConfig::try_from(parse(&[
            "--clock",
            "monotonic",
            "--clock-policy",
            "high-water-mark",
            "--exhaustion-timeout-ms",
            "250",
        ]))
        .unwrap();
        assert_eq!(config.clock, ClockKind::Monotonic);
        assert_eq!(config.clock_policy, ClockPolicy::HighWaterMark);
        assert_eq!(config.exhaustion_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn layout_errors_surface() {
        let err = DemoConfig::try_from(parse(&["--timestamp-bits", "51", "--node-id-bits", "11"]))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::FieldWidthOverflow { bits: 62, max: 59 })
        );
    }

    #[test]
    fn rejects_empty_runs() {
        assert!(DemoConfig::try_from(parse(&["--nodes", "0"])).is_err());
        assert!(DemoConfig::try_from(parse(&["--consumers", "0"])).is_err());
    }

    #[test]
    fn rejects_overflowing_totals() {
        let max = usize::MAX.to_string();
        let err = DemoConfig::try_from(parse(&[
            "--nodes",
            "2048",
            "--consumers",
            max.as_str(),
            "--ids-per-consumer",
            "2",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Overflow in total id computation"));

        let err = DemoConfig::try_from(parse(&[
            "--consumers",
            "2",
            "--ids-per-consumer",
            max.as_str(),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Overflow in total id computation"));

        let config = DemoConfig::try_from(parse(&[
            "--nodes",
            "4",
            "--consumers",
            "8",
            "--ids-per-consumer",
            "10000",
        ]))
        .unwrap();
        assert_eq!(config.total_ids, 320_000);
    }

    #[test]
    fn node_ids_must_fit_layout() {
        let config = DemoConfig::try_from(parse(&[
            "--node-id-bits",
            "3",
            "--nodes",
            "4",
            "--node-offset",
            "4",
        ]))
        .unwrap();
        assert_eq!(config.node_ids().collect::<Vec<_>>(), vec![4, 5, 6, 7]);

        let err = DemoConfig::try_from(parse(&[
            "--node-id-bits",
            "3",
            "--nodes",
            "4",
            "--node-offset",
            "5",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("max = 7"));
    }
}
