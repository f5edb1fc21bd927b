//! Pool statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use wirepool_core::PoolState;

/// A point-in-time snapshot of pool activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct PoolStats {
    /// Current lifecycle state.
    pub state: PoolState,
    /// Current generation (0 before the first connect).
    pub generation: u64,
    /// Connections sitting in the idle store.
    pub idle: usize,
    /// Connections currently checked out.
    pub in_use: usize,
    /// Successful dials.
    pub connections_created: u64,
    /// Physical closes.
    pub connections_closed: u64,
    /// Failed dials (cancelled dials are not counted).
    pub dial_failures: u64,
    /// Successful checkouts, reused or freshly dialed.
    pub checkouts: u64,
    /// Connections put back into the idle store.
    pub returns: u64,
    /// Idle connections discarded for belonging to an older generation.
    pub evicted_stale: u64,
    /// Idle connections discarded for exceeding the idle timeout or lifetime.
    pub evicted_idle: u64,
    /// In-flight connections closed by a disconnect whose deadline fired.
    pub force_closed: u64,
}

/// Lock-free counters behind [`PoolStats`].
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) created: AtomicU64,
    pub(crate) closed: AtomicU64,
    pub(crate) dial_failures: AtomicU64,
    pub(crate) checkouts: AtomicU64,
    pub(crate) returns: AtomicU64,
    pub(crate) evicted_stale: AtomicU64,
    pub(crate) evicted_idle: AtomicU64,
    pub(crate) force_closed: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        state: PoolState,
        generation: u64,
        idle: usize,
        in_use: usize,
    ) -> PoolStats {
        PoolStats {
            state,
            generation,
            idle,
            in_use,
            connections_created: self.created.load(Ordering::Relaxed),
            connections_closed: self.closed.load(Ordering::Relaxed),
            dial_failures: self.dial_failures.load(Ordering::Relaxed),
            checkouts: self.checkouts.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            evicted_stale: self.evicted_stale.load(Ordering::Relaxed),
            evicted_idle: self.evicted_idle.load(Ordering::Relaxed),
            force_closed: self.force_closed.load(Ordering::Relaxed),
        }
    }
}
