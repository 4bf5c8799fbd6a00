//! Isolation walker — C4, §4.2.
//!
//! Scans a PFN window ascending, pulling movable in-use frames out of
//! the LRU and splitting free buddies into singleton fragments. Never
//! blocks: every acquisition below is try-style, matching spec §4.2's
//! contract — on return every appended fragment is either free and
//! owned by the region, or isolated from LRU *and* page-locked.

use super::config::MAX_FRAGMENTS;
use super::filter;
use super::fragment::{Fragment, Kind, Pfn};
use super::host::PageHost;
use super::region::Region;

/// Takes the whole free block at `pfn` (order `order`) out of the
/// allocator, splits it to single frames, and feeds as many as fit
/// into `region` as `Free` fragments; anything left over goes straight
/// back to the allocator.
fn isolate_buddy_block<H: PageHost>(host: &H, region: &mut Region, pfn: Pfn, order: u32) -> usize {
    let remaining = MAX_FRAGMENTS.saturating_sub(region.fragments.len());
    if remaining == 0 {
        return 0;
    }
    if host.isolate_free_block_at(pfn, order).is_err() {
        return 0;
    }

    let pieces = host.split_to_single_frames(pfn, order);
    let mut taken = 0;
    for p in pieces {
        if taken < remaining {
            let frag = Fragment::new(p, Kind::Free, false, false);
            if region.push_fragment(frag).is_ok() {
                taken += 1;
                continue;
            }
        }
        host.release_frame(p);
    }
    taken
}

/// Scans `[start_pfn, end_pfn)`, populating `region` with fragments.
/// Stops early once the region is full. Returns the number of
/// fragments appended.
pub fn isolate_pages<H: PageHost>(host: &H, region: &mut Region, start_pfn: Pfn, end_pfn: Pfn) -> usize {
    let mut isolated = 0;
    let mut pfn = start_pfn;

    while pfn < end_pfn {
        if region.is_full() {
            break;
        }

        if !host.is_valid(pfn) {
            pfn += 1;
            continue;
        }

        if host.is_buddy_free(pfn) {
            let order = host.buddy_order(pfn);
            let taken = isolate_buddy_block(host, region, pfn, order);
            isolated += taken;
            pfn += 1u64 << order;
            continue;
        }

        if !filter::is_suitable(host, pfn) {
            pfn += 1;
            continue;
        }

        if host.isolate_lru(pfn).is_err() {
            pfn += 1;
            continue;
        }

        if host.try_lock_page(pfn).is_err() {
            host.putback_lru(pfn);
            pfn += 1;
            continue;
        }

        let frag = Fragment::new(pfn, Kind::InUse, host.is_anon(pfn), host.is_dirty(pfn));
        match region.push_fragment(frag) {
            Ok(()) => isolated += 1,
            Err(_) => {
                host.unlock_page(pfn);
                host.putback_lru(pfn);
            }
        }
        pfn += 1;
    }

    isolated
}
