#![doc = include_str!("../README.md")]

mod config;
mod driver;
mod ledger;
mod telemetry;

use anyhow::bail;
use clap::Parser;
use config::{CliArgs, ClockKind, DemoConfig};
use ledger::IdLedger;
use snowbit::{LockSnowflakeGenerator, MonotonicClock, SystemClock, ThreadSleep, TimeSource};
use std::time::Instant;
use telemetry::init_telemetry;

/// Upper bound on the ledger's up-front allocation; larger runs grow it as
/// they go.
const LEDGER_CAPACITY_HINT: usize = 1 << 20;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = DemoConfig::try_from(args)?;

    init_telemetry()?;

    tracing::info!("Snowflake config:\n{}", config.layout);
    if cfg!(debug_assertions) {
        tracing::info!("Starting demo with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting demo with {} nodes x {} consumers x {} ids",
            config.nodes,
            config.consumers,
            config.ids_per_consumer
        );
    }

    match config.clock {
        ClockKind::System => run(&config, SystemClock),
        ClockKind::Monotonic => run(&config, MonotonicClock::new()),
    }
}

fn run<T>(config: &DemoConfig, clock: T) -> anyhow::Result<()>
where
    T: TimeSource + Clone + Send + Sync,
{
    let generators = config
        .node_ids()
        .map(|node_id| -> anyhow::Result<_> {
            let generator = LockSnowflakeGenerator::with_time(
                config.layout,
                node_id,
                clock.clone(),
                ThreadSleep,
            )?
            .with_clock_policy(config.clock_policy);
            Ok(match config.exhaustion_timeout {
                Some(timeout) => generator.with_exhaustion_timeout(timeout),
                None => generator,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let ledger = IdLedger::with_capacity(config.total_ids.min(LEDGER_CAPACITY_HINT));
    let started = Instant::now();
    driver::drive(
        &generators,
        config.consumers,
        config.ids_per_consumer,
        &ledger,
    )?;
    let elapsed = started.elapsed();

    let summary = ledger.summary();
    tracing::info!(
        "All done with {} ids - OOO count [{}] - Time taken [{}] ms",
        summary.total,
        summary.out_of_order,
        elapsed.as_millis()
    );

    if !summary.duplicates.is_empty() {
        bail!(
            "{} duplicate ids minted, first: {}",
            summary.duplicates.len(),
            summary.duplicates[0]
        );
    }
    Ok(())
}
