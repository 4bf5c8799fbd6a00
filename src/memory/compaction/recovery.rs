//! Recovery and cleanup — C8, §4.7.
//!
//! Two disjoint endings for a region: `complete` tears down a region
//! that made it all the way through C2-C7, handing the free fragments'
//! slots back to the allocator at their *new* address — the permutation
//! the planner built guarantees that's exactly the set of physical
//! addresses nothing claims as in-use anymore. `abort` unwinds a region
//! that failed partway through, restoring every touched frame to
//! exactly where it stood before the walker ever looked at it. Both are
//! safe to call on a region where some fragments never got as far as
//! the others — every call here is a no-op on state that isn't there.

use super::host::{PageHost, RmapHost};
use super::region::Region;

/// Releases every free fragment's slot back to the allocator at its
/// planned destination. In-use fragments need no further work here:
/// `protocol::remap_phase` already left them locked at their
/// destination, on the LRU, and with a resolved mapping.
pub fn complete<H: PageHost>(host: &H, region: &Region) {
    for frag in region.fragments.iter().filter(|f| f.is_free()) {
        host.release_frame(frag.new_pfn);
    }
}

/// Unwinds a region that failed in C4-C7. Every in-use fragment gets
/// its original translation restored, its page-lock dropped, its LRU
/// isolation undone, and its anon rmap holder released; every free
/// fragment goes back to the allocator at its *original* address,
/// since nothing physical moved before the failure.
pub fn abort<H: PageHost + RmapHost>(host: &H, region: &Region) {
    for frag in &region.fragments {
        if frag.is_in_use() {
            host.reinstate_original(frag.old_pfn);
            host.unlock_page(frag.old_pfn);
            host.putback_lru(frag.old_pfn);
            if let Some(handle) = frag.anon_holder {
                host.release_anon_rmap_holder(handle);
            }
        } else {
            host.release_frame(frag.old_pfn);
        }
    }
}
