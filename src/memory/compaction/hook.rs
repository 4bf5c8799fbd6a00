//! Entry point — C9, §6.
//!
//! `try_compact` is the only thing outside this module needs to call.
//! It owns one region end-to-end: walk, plan, migrate, update, clean
//! up — wiring C2 through C8 together and turning whatever happened
//! into one of five outcomes the caller can act on without knowing any
//! of this module's internals.

use bitflags::bitflags;

use super::config::{self, GLOBAL_STATS, MAX_FRAGMENTS};
use super::dpu;
use super::error::CompactError;
use super::fragment::Pfn;
use super::host::{Accelerator, PageHost, RmapHost, TlbHost};
use super::planner;
use super::protocol;
use super::recovery;
use super::region::{self, Region};
use super::walker;

bitflags! {
    /// Mirrors the caller context a real allocation-path invocation
    /// would carry (sync vs. async compaction, whether blocking is
    /// available) — §6.
    #[derive(Debug, Clone, Copy)]
    pub struct CompactFlags: u32 {
        /// Caller can tolerate this call taking a while; without it, a
        /// request spanning more than one region's worth of frames is
        /// rejected outright rather than run in an atomic context.
        const ALLOW_SLEEP = 0b01;
        /// Caller wants synchronous, foreground compaction rather than
        /// best-effort background work. Informational only here — this
        /// engine has no background path to defer to.
        const SYNC = 0b10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactOutcome {
    /// The whole requested window was scanned. `pages_moved` counts
    /// fragments that completed the move; a handful may have rolled
    /// back individually (§7 `DestinationLockFailure` /
    /// `MappingSwingFailure`) without failing the region as a whole.
    Success { pages_moved: u64 },
    /// The region filled to `MAX_FRAGMENTS` before the scan reached
    /// the end of the requested window; what was collected migrated
    /// successfully, but callers wanting the rest should call again
    /// starting past where this region ended.
    Partial { pages_moved: u64 },
    /// The whole window was scanned and it was already fully packed —
    /// no fragment needed to move.
    Complete,
    /// Nothing ran this call: compaction is disabled, the request
    /// doesn't justify the work (`order == 0`), or the caller can't
    /// tolerate the call blocking and the window is too large to
    /// guarantee it won't.
    Skipped,
    /// A C4-C7 stage failed; the region was rolled back in full and no
    /// fragment was left half-migrated.
    Failed(CompactError),
}

/// Runs one compaction attempt over `[base_pfn, base_pfn + size_pfns)`.
pub fn try_compact<H>(host: &H, base_pfn: Pfn, size_pfns: u64, order: u32, flags: CompactFlags) -> CompactOutcome
where
    H: PageHost + RmapHost + TlbHost + Accelerator,
{
    if !config::compaction_enabled() {
        GLOBAL_STATS.record_skipped();
        return CompactOutcome::Skipped;
    }
    if order == 0 {
        GLOBAL_STATS.record_skipped();
        return CompactOutcome::Skipped;
    }
    if !flags.contains(CompactFlags::ALLOW_SLEEP) && size_pfns > MAX_FRAGMENTS as u64 {
        GLOBAL_STATS.record_skipped();
        return CompactOutcome::Skipped;
    }

    let mut reg = Region::new(base_pfn, size_pfns);
    reg.advance(region::State::Collecting);

    let isolated = walker::isolate_pages(host, &mut reg, base_pfn, base_pfn + size_pfns);
    let truncated = reg.is_full();

    if isolated == 0 {
        GLOBAL_STATS.record_skipped();
        return CompactOutcome::Skipped;
    }

    planner::plan(&mut reg);
    let moved_count = reg.fragments.iter().filter(|f| f.is_in_use() && f.moves()).count() as u64;

    // Even when nothing needs to move (already-packed / all-InUse
    // regions), every in-use fragment still came out of the walker
    // isolated from LRU and page-locked — it has to go through the
    // same unmap/remap/flush sequence to get unlocked and returned,
    // `remap_phase`'s `!frag.moves()` branch does exactly that and
    // `dpu::submit` no-ops on an empty move list, so there's no
    // special case to short-circuit here (spec §8: "All-InUse region
    // … remap is effectively a no-op but still flushes TLB").
    reg.advance(region::State::Moving);
    protocol::unmap_phase(host, &mut reg);

    if let Err(e) = dpu::submit(host, &reg) {
        reg.advance(region::State::Failed);
        recovery::abort(host, &reg);
        GLOBAL_STATS.record_failure();
        return CompactOutcome::Failed(e);
    }

    reg.advance(region::State::Updating);
    let rolled_back = protocol::remap_phase(host, &reg);
    if rolled_back > 0 {
        crate::log::log_warn(&alloc::format!(
            "region [{:#x}, {:#x}): {} fragment(s) rolled back during remap",
            reg.base_pfn,
            reg.base_pfn + reg.size_pfns,
            rolled_back,
        ));
    }
    reg.advance(region::State::Complete);
    recovery::complete(host, &reg);
    reg.log_mapping();

    GLOBAL_STATS.record_success();
    let completed = moved_count - rolled_back as u64;
    if moved_count == 0 {
        if truncated {
            CompactOutcome::Partial { pages_moved: 0 }
        } else {
            CompactOutcome::Complete
        }
    } else if truncated {
        CompactOutcome::Partial { pages_moved: completed }
    } else {
        CompactOutcome::Success { pages_moved: completed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::compaction::host::fake::FakeHost;

    fn populate_fragmented_region(host: &FakeHost) {
        // 0,2,4 in use; 1,3,5 free -> classic checkerboard fragmentation.
        host.add_in_use(0, 10);
        host.add_free(1);
        host.add_in_use(2, 20);
        host.add_free(3);
        host.add_in_use(4, 30);
        host.add_free(5);
    }

    #[test]
    fn disabled_compaction_is_skipped() {
        let host = FakeHost::new();
        populate_fragmented_region(&host);
        config::set_compaction_enabled(false);
        let outcome = try_compact(&host, 0, 6, 1, CompactFlags::ALLOW_SLEEP);
        config::set_compaction_enabled(true);
        assert_eq!(outcome, CompactOutcome::Skipped);
    }

    #[test]
    fn order_zero_is_skipped() {
        let host = FakeHost::new();
        populate_fragmented_region(&host);
        let outcome = try_compact(&host, 0, 6, 0, CompactFlags::ALLOW_SLEEP);
        assert_eq!(outcome, CompactOutcome::Skipped);
    }

    #[test]
    fn checkerboard_region_compacts_successfully() {
        let host = FakeHost::new();
        populate_fragmented_region(&host);
        let outcome = try_compact(&host, 0, 6, 1, CompactFlags::ALLOW_SLEEP);
        match outcome {
            CompactOutcome::Success { pages_moved } => assert!(pages_moved > 0),
            other => panic!("expected Success, got {:?}", other),
        }
        // In-use content should have packed to the low end: 0,1,2 in use.
        assert!(host.content_at(0).is_some());
        assert!(host.content_at(1).is_some());
        assert!(host.content_at(2).is_some());
    }

    #[test]
    fn already_packed_region_reports_complete() {
        let host = FakeHost::new();
        host.add_in_use(0, 1);
        host.add_in_use(1, 2);
        host.add_free(2);
        let outcome = try_compact(&host, 0, 3, 1, CompactFlags::ALLOW_SLEEP);
        assert_eq!(outcome, CompactOutcome::Complete);
        // The walker isolated and locked both in-use frames before the
        // planner found nothing to move; remap_phase still has to run
        // to unlock them, put them back on the LRU, and flush the TLB —
        // that's the bug this test is guarding against.
        assert!(!host.is_locked(0));
        assert!(!host.is_locked(1));
        assert!(host.is_on_lru(0));
        assert!(host.is_on_lru(1));
        assert!(!host.is_isolated(0));
        assert!(!host.is_isolated(1));
        assert_eq!(host.tlb_flush_count(), 1);
    }

    #[test]
    fn all_in_use_region_unlocks_frames_and_flushes_tlb() {
        // No free fragment at all: every frame is in use and none can
        // move anywhere, but the walker still isolates and locks all of
        // them going in.
        let host = FakeHost::new();
        host.add_in_use(0, 1);
        host.add_in_use(1, 2);
        host.add_in_use(2, 3);
        let outcome = try_compact(&host, 0, 3, 1, CompactFlags::ALLOW_SLEEP);
        assert_eq!(outcome, CompactOutcome::Complete);
        for pfn in 0..3 {
            assert!(!host.is_locked(pfn), "frame {pfn} left locked");
            assert!(host.is_on_lru(pfn), "frame {pfn} never returned to LRU");
        }
        assert_eq!(host.tlb_flush_count(), 1);
    }

    #[test]
    fn accelerator_failure_rolls_back_and_reports_failed() {
        let host = FakeHost::new();
        populate_fragmented_region(&host);
        host.set_dpu_failure(true);
        let outcome = try_compact(&host, 0, 6, 1, CompactFlags::ALLOW_SLEEP);
        assert_eq!(outcome, CompactOutcome::Failed(CompactError::AcceleratorError));
    }

    #[test]
    fn second_compaction_run_is_a_no_op() {
        let host = FakeHost::new();
        populate_fragmented_region(&host);
        let first = try_compact(&host, 0, 6, 1, CompactFlags::ALLOW_SLEEP);
        assert!(matches!(first, CompactOutcome::Success { .. }));

        let layout_after_first: Vec<Option<u64>> = (0..6).map(|pfn| host.content_at(pfn)).collect();

        let second = try_compact(&host, 0, 6, 1, CompactFlags::ALLOW_SLEEP);
        assert_eq!(second, CompactOutcome::Complete);

        let layout_after_second: Vec<Option<u64>> = (0..6).map(|pfn| host.content_at(pfn)).collect();
        assert_eq!(layout_after_first, layout_after_second);
    }

    #[test]
    fn refcount_is_conserved_across_a_full_compaction() {
        let host = FakeHost::new();
        populate_fragmented_region(&host);
        host.set_refcount(0, 3);
        host.set_refcount(2, 5);
        host.set_refcount(4, 7);

        // Index refcounts by content rather than PFN: a moved fragment's
        // content follows it to its new frame, and invariant 5 (§8) is
        // about the refcount of the *frame being compacted*, not of
        // whichever PFN happens to hold that role afterward.
        let before: alloc::collections::BTreeMap<u64, u64> = [(10, 3), (20, 5), (30, 7)].into_iter().collect();

        let outcome = try_compact(&host, 0, 6, 1, CompactFlags::ALLOW_SLEEP);
        assert!(matches!(outcome, CompactOutcome::Success { .. }));

        for pfn in 0..6 {
            if let Some(content) = host.content_at(pfn) {
                if let Some(&expected) = before.get(&content) {
                    assert_eq!(host.refcount(pfn), expected, "refcount not conserved for content {content}");
                }
            }
        }
    }

    #[test]
    fn large_request_without_sleep_permission_is_skipped() {
        let host = FakeHost::new();
        populate_fragmented_region(&host);
        let huge_size = MAX_FRAGMENTS as u64 + 1;
        let outcome = try_compact(&host, 0, huge_size, 1, CompactFlags::empty());
        assert_eq!(outcome, CompactOutcome::Skipped);
    }
}
