//! Progress accounting for a scan (positions attempted, skipped, finished).
//!
//! The producer task is the only writer; any holder of the `Arc` can take a
//! snapshot at any time. Consumers can compute the remaining estimate as
//! `total - skipped` and completion as `done / total`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the scan counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Positions taken from the cursor (fetched or skipped).
    pub ops: u64,
    /// Number of cells in every zoom's box; fixed once params are resolved.
    pub total: u64,
    /// Positions that produced no tile (absent, empty, or another job's).
    pub skipped: u64,
    /// Positions fully handled (tiles delivered plus skips).
    pub done: u64,
}

impl StatsSnapshot {
    /// Remaining-length estimate: cells that may still yield a tile.
    pub fn length(&self) -> u64 {
        self.total.saturating_sub(self.skipped)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.done as f64 / self.total as f64).min(1.0)
    }
}

/// Shared counters. Only the producer mutates them.
#[derive(Debug, Default)]
pub struct ScanStats {
    ops: AtomicU64,
    total: AtomicU64,
    skipped: AtomicU64,
    done: AtomicU64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ops: self.ops.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
            skipped: self.skipped.load(Ordering::Acquire),
            done: self.done.load(Ordering::Acquire),
        }
    }

    pub fn length(&self) -> u64 {
        self.snapshot().length()
    }

    pub(crate) fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Release);
    }

    pub(crate) fn record_op(&self) {
        self.ops.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_done(&self) {
        self.done.fetch_add(1, Ordering::AcqRel);
    }

    /// Count a skip and return the new remaining length.
    pub(crate) fn record_skip(&self) -> u64 {
        self.skipped.fetch_add(1, Ordering::AcqRel);
        self.done.fetch_add(1, Ordering::AcqRel);
        self.length()
    }
}
