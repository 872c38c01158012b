use parking_lot::Mutex;
use std::collections::HashSet;

#[derive(Debug, Default)]
struct LedgerState {
    seen: HashSet<u64>,
    last_id: Option<u64>,
    out_of_order: u64,
    duplicates: Vec<u64>,
}

/// Records every ID consumers receive, in arrival order.
///
/// Arrival order across threads says nothing about mint order, so an ID
/// smaller than the one recorded before it is only counted, never treated as
/// an error. Duplicates are kept for the caller to fail on.
#[derive(Debug, Default)]
pub struct IdLedger {
    state: Mutex<LedgerState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total: usize,
    pub out_of_order: u64,
    pub duplicates: Vec<u64>,
}

impl IdLedger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                seen: HashSet::with_capacity(capacity),
                ..LedgerState::default()
            }),
        }
    }

    /// Records `id`, returning `false` if it was already seen.
    pub fn record(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        if state.last_id.is_some_and(|last| last > id) {
            state.out_of_order += 1;
        }
        state.last_id = Some(id);

        let fresh = state.seen.insert(id);
        if !fresh {
            state.duplicates.push(id);
        }
        fresh
    }

    pub fn summary(&self) -> LedgerSummary {
        let state = self.state.lock();
        LedgerSummary {
            total: state.seen.len() + state.duplicates.len(),
            out_of_order: state.out_of_order,
            duplicates: state.duplicates.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ids_arriving_out_of_order() {
        let ledger = IdLedger::default();
        for id in [10, 20, 15, 30, 5] {
            assert!(ledger.record(id));
        }
        let summary = ledger.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.out_of_order, 2);
        assert!(summary.duplicates.is_empty());
    }

    #[test]
    fn keeps_duplicates() {
        let ledger = IdLedger::with_capacity(4);
        assert!(ledger.record(1));
        assert!(ledger.record(2));
        assert!(!ledger.record(2));
        assert!(!ledger.record(1));

        let summary = ledger.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.duplicates, vec![2, 1]);
        assert_eq!(summary.out_of_order, 1);
    }
}
