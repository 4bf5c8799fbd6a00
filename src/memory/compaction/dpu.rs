//! DPU submission — C7, §4.5.
//!
//! Builds the `(src, dst)` pair list for every fragment that actually
//! moves and hands it to the accelerator in one batch. The region
//! itself never touches page contents — that's the whole point of
//! offloading the copy.

use alloc::vec::Vec;

use super::config::GLOBAL_STATS;
use super::error::CompactError;
use super::host::{Accelerator, TlbHost};
use super::region::Region;

/// Submits every moving in-use fragment to the accelerator as one
/// batch. On success, issues the write-barrier + DMA sync pair the
/// spec requires before any consumer can trust the destination
/// frames' contents. On failure, the region is left untouched here —
/// the caller drives it to `Failed` and recovery handles unwinding.
pub fn submit<H: Accelerator + TlbHost>(host: &H, region: &Region) -> Result<(), CompactError> {
    let moves: Vec<(u64, u64)> = region
        .fragments
        .iter()
        .filter(|f| f.is_in_use() && f.moves())
        .map(|f| (f.old_pfn, f.new_pfn))
        .collect();

    if moves.is_empty() {
        return Ok(());
    }

    host.dpu_move(&moves)?;
    host.write_barrier();
    host.dma_sync_for_cpu();
    GLOBAL_STATS.record_moved(moves.len() as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::compaction::fragment::{Fragment, Kind};
    use crate::memory::compaction::host::fake::FakeHost;
    use crate::memory::compaction::planner;

    #[test]
    fn moving_fragments_are_copied_by_content() {
        let host = FakeHost::new();
        host.add_in_use(10, 0xCAFE);
        host.add_free(11);

        let mut region = Region::new(10, 2);
        region.push_fragment(Fragment::new(10, Kind::InUse, false, false)).unwrap();
        region.push_fragment(Fragment::new(11, Kind::Free, false, false)).unwrap();
        region.fragments[0].new_pfn = 11;
        region.fragments[1].new_pfn = 10;

        submit(&host, &region).unwrap();
        assert_eq!(host.content_at(11), Some(0xCAFE));
    }

    #[test]
    fn already_packed_region_submits_nothing() {
        let host = FakeHost::new();
        host.add_in_use(0, 1);
        let mut region = Region::new(0, 1);
        region.push_fragment(Fragment::new(0, Kind::InUse, false, false)).unwrap();
        planner::plan(&mut region);
        submit(&host, &region).unwrap();
    }

    #[test]
    fn accelerator_failure_propagates() {
        let host = FakeHost::new();
        host.add_in_use(10, 1);
        host.add_free(11);
        host.set_dpu_failure(true);

        let mut region = Region::new(10, 2);
        region.push_fragment(Fragment::new(10, Kind::InUse, false, false)).unwrap();
        region.push_fragment(Fragment::new(11, Kind::Free, false, false)).unwrap();
        region.fragments[0].new_pfn = 11;
        region.fragments[1].new_pfn = 10;

        let err = submit(&host, &region).unwrap_err();
        assert_eq!(err, CompactError::AcceleratorError);
    }
}
