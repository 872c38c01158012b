use crate::ledger::IdLedger;
use anyhow::anyhow;
use portable_atomic::{AtomicBool, Ordering};
use snowbit::IdGenerator;
use std::thread::scope;

/// Runs `consumers` threads against every generator, each requesting
/// `ids_per_consumer` IDs and recording them in `ledger`.
///
/// The first generator error raises a shared stop flag; every consumer checks
/// it before each request, so the run winds down and that error is returned.
/// Duplicates are recorded, not raised; inspect the ledger afterwards.
pub fn drive<G>(
    generators: &[G],
    consumers: usize,
    ids_per_consumer: usize,
    ledger: &IdLedger,
) -> anyhow::Result<()>
where
    G: IdGenerator + Sync,
{
    let stop = AtomicBool::new(false);
    let stop = &stop;

    scope(|s| {
        let handles = generators
            .iter()
            .flat_map(|generator| (0..consumers).map(move |_| generator))
            .map(|generator| {
                s.spawn(move || -> snowbit::Result<()> {
                    for _ in 0..ids_per_consumer {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        let id = generator.next_id().inspect_err(|_| {
                            stop.store(true, Ordering::Relaxed);
                        })?;
                        if !ledger.record(id) {
                            tracing::error!(id, "duplicate id minted");
                        }
                    }
                    Ok(())
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow!("consumer thread panicked"))??;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use portable_atomic::AtomicU64;
    use snowbit::{
        ClockPolicy, DEFAULT_EPOCH, IdGenStatus, LayoutConfig, LockSnowflakeGenerator,
        MonotonicClock, ThreadSleep,
    };

    /// Counts up from `base`, failing every call after the first `fail_after`.
    #[derive(Debug)]
    struct CountingGenerator {
        base: u64,
        minted: AtomicU64,
        fail_after: Option<u64>,
    }

    impl CountingGenerator {
        fn new(base: u64, fail_after: Option<u64>) -> Self {
            Self {
                base,
                minted: AtomicU64::new(0),
                fail_after,
            }
        }
    }

    impl IdGenerator for CountingGenerator {
        fn next_id(&self) -> snowbit::Result<u64> {
            let n = self.minted.fetch_add(1, Ordering::Relaxed);
            match self.fail_after {
                Some(max) if n >= max => {
                    Err(snowbit::Error::TimestampOverflow { elapsed: n, max })
                }
                _ => Ok(self.base + n),
            }
        }

        fn try_poll_id(&self) -> snowbit::Result<IdGenStatus> {
            self.next_id().map(|id| IdGenStatus::Ready { id })
        }
    }

    #[test]
    fn shared_generators_never_repeat() {
        let layout = LayoutConfig::try_default().unwrap();
        let generators = (0..4)
            .map(|node_id| LockSnowflakeGenerator::new(layout, node_id).unwrap())
            .collect::<Vec<_>>();
        let ledger = IdLedger::with_capacity(4 * 3 * 100);

        drive(&generators, 3, 100, &ledger).unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.total, 1200);
        assert!(summary.duplicates.is_empty());
    }

    #[test]
    fn narrow_sequence_never_repeats() {
        let layout = LayoutConfig::new(DEFAULT_EPOCH, 40, 19).unwrap();
        let clock = MonotonicClock::new();
        let generators = (0..2)
            .map(|node_id| {
                LockSnowflakeGenerator::with_time(layout, node_id, clock.clone(), ThreadSleep)
                    .unwrap()
                    .with_clock_policy(ClockPolicy::HighWaterMark)
            })
            .collect::<Vec<_>>();
        let ledger = IdLedger::default();

        drive(&generators, 4, 50, &ledger).unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.total, 400);
        assert!(summary.duplicates.is_empty());
    }

    #[test]
    fn generator_errors_stop_the_run() {
        // 40 timestamp bits counted from 1970 ran out in 2004.
        let layout = LayoutConfig::new(0, 40, 11).unwrap();
        let generators = [LockSnowflakeGenerator::new(layout, 1).unwrap()];
        let ledger = IdLedger::default();

        let err = drive(&generators, 2, 10, &ledger).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<snowbit::Error>(),
            Some(snowbit::Error::TimestampOverflow { .. })
        ));
        assert_eq!(ledger.summary().total, 0);
    }

    #[test]
    fn one_failing_generator_stops_every_consumer() {
        const IDS_PER_CONSUMER: usize = 1_000_000;

        // Spawned first, so it fails long before the others could finish.
        let generators = [
            CountingGenerator::new(1 << 40, Some(5)),
            CountingGenerator::new(0, None),
        ];
        let ledger = IdLedger::default();

        let err = drive(&generators, 2, IDS_PER_CONSUMER, &ledger).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<snowbit::Error>(),
            Some(snowbit::Error::TimestampOverflow { max: 5, .. })
        ));

        let summary = ledger.summary();
        assert!(summary.duplicates.is_empty());
        assert!(summary.total < 2 * IDS_PER_CONSUMER);
        assert!(generators[1].minted.load(Ordering::Relaxed) < 2 * IDS_PER_CONSUMER as u64);
    }
}
