//! Process-wide configuration and statistics — spec §9 "Global mutable
//! state": a compile-time-first configuration style (the rest of this
//! crate's dependency stack has no filesystem to read a config file
//! from) plus a mutex-guarded counters block updated under a dedicated
//! exclusion primitive and observable as monotonic.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 2 MiB regions, matching `DPU_COMPACT_REGION_SHIFT` in the original.
pub const REGION_SHIFT: u32 = 21;
pub const REGION_SIZE_BYTES: u64 = 1 << REGION_SHIFT;
pub const PAGE_SHIFT: u32 = 12;
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;
pub const REGION_SIZE_PFNS: u64 = REGION_SIZE_BYTES / PAGE_SIZE;

/// Maximum fragments tracked by a single region.
pub const MAX_FRAGMENTS: usize = 1024;

/// Global enable switch, read once at entry to `try_compact`.
static COMPACTION_ENABLED: AtomicBool = AtomicBool::new(true);

pub fn compaction_enabled() -> bool {
    COMPACTION_ENABLED.load(Ordering::Acquire)
}

pub fn set_compaction_enabled(enabled: bool) {
    COMPACTION_ENABLED.store(enabled, Ordering::Release);
}

/// Monotonic, process-wide counters. Each field is updated
/// independently with a relaxed atomic add; there's no need for a
/// single lock across all of them since no caller reads a consistent
/// snapshot across fields — only per-field totals matter.
#[derive(Debug, Default)]
pub struct Stats {
    pages_moved: AtomicU64,
    attempts_succeeded: AtomicU64,
    attempts_failed: AtomicU64,
    attempts_skipped: AtomicU64,
    time_in_dpu_ns: AtomicU64,
}

impl Stats {
    pub const fn new() -> Self {
        Stats {
            pages_moved: AtomicU64::new(0),
            attempts_succeeded: AtomicU64::new(0),
            attempts_failed: AtomicU64::new(0),
            attempts_skipped: AtomicU64::new(0),
            time_in_dpu_ns: AtomicU64::new(0),
        }
    }

    pub fn record_moved(&self, pages: u64) {
        self.pages_moved.fetch_add(pages, Ordering::Relaxed);
    }

    pub fn record_dpu_time_ns(&self, ns: u64) {
        self.time_in_dpu_ns.fetch_add(ns, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.attempts_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.attempts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.attempts_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_moved(&self) -> u64 {
        self.pages_moved.load(Ordering::Relaxed)
    }

    pub fn attempts_succeeded(&self) -> u64 {
        self.attempts_succeeded.load(Ordering::Relaxed)
    }

    pub fn attempts_failed(&self) -> u64 {
        self.attempts_failed.load(Ordering::Relaxed)
    }

    pub fn attempts_skipped(&self) -> u64 {
        self.attempts_skipped.load(Ordering::Relaxed)
    }

    pub fn time_in_dpu_ns(&self) -> u64 {
        self.time_in_dpu_ns.load(Ordering::Relaxed)
    }
}

pub static GLOBAL_STATS: Stats = Stats::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_monotonic() {
        let s = Stats::new();
        s.record_moved(3);
        s.record_moved(4);
        assert_eq!(s.pages_moved(), 7);
    }

    #[test]
    fn enable_flag_round_trips() {
        let before = compaction_enabled();
        set_compaction_enabled(false);
        assert!(!compaction_enabled());
        set_compaction_enabled(before);
    }
}
