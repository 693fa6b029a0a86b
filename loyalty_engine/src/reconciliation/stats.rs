use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Running totals for a reconciliation pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    lookups: AtomicU64,
    resolved: AtomicU64,
    not_found: AtomicU64,
    rate_limited: AtomicU64,
    transport_errors: AtomicU64,
    ledger_errors: AtomicU64,
    pauses: AtomicU64,
}

/// A point-in-time copy of [`PoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Lookups started
    pub lookups: u64,
    /// Lookups that returned a definitive answer
    pub resolved: u64,
    pub not_found: u64,
    pub rate_limited: u64,
    pub transport_errors: u64,
    /// Definitive answers that could not be written to the ledger
    pub ledger_errors: u64,
    /// Times the pool was paused after being open
    pub pauses: u64,
}

macro_rules! counter {
    ($name:ident, $field:ident) => {
        pub(crate) fn $name(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl PoolStats {
    counter!(record_lookup, lookups);
    counter!(record_resolved, resolved);
    counter!(record_not_found, not_found);
    counter!(record_rate_limited, rate_limited);
    counter!(record_transport_error, transport_errors);
    counter!(record_ledger_error, ledger_errors);
    counter!(record_pause, pauses);

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            ledger_errors: self.ledger_errors.load(Ordering::Relaxed),
            pauses: self.pauses.load(Ordering::Relaxed),
        }
    }
}
