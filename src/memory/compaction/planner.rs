//! Placement planner — C5, §4.3.
//!
//! Single forward pass over the fragment set: `InUse` fragments get
//! the lowest available destination PFNs first, ascending from the
//! region base; `Free` fragments get whatever is left over, which
//! necessarily lands above every `InUse` destination. One pass, O(n).
//!
//! The original source carries two versions of this planner: a
//! two-pointer front/back variant in `dpu_compact_execute` that walks
//! past the end of the free list on certain fragment orderings, and a
//! corrected single-pass variant in `dpu_defragment_region`. This
//! follows the latter — there is no walk-from-both-ends here, just one
//! running cursor.

use super::fragment::Pfn;
use super::region::Region;

/// Assigns `new_pfn` to every fragment in `region`, in place. Returns
/// the highest `new_pfn` given to an `InUse` fragment, or `None` if the
/// region has no in-use fragments at all — the boundary the remap
/// protocol uses to tell "still part of the compacted region" from
/// "tail past the live set, hand back to the allocator".
pub fn plan(region: &mut Region) -> Option<Pfn> {
    let mut next_target = region.base_pfn;

    for frag in region.fragments.iter_mut().filter(|f| f.is_in_use()) {
        frag.new_pfn = next_target;
        next_target += 1;
    }
    let last_inuse_pfn = if next_target > region.base_pfn {
        Some(next_target - 1)
    } else {
        None
    };

    for frag in region.fragments.iter_mut().filter(|f| f.is_free()) {
        frag.new_pfn = next_target;
        next_target += 1;
    }

    region.last_inuse_pfn = last_inuse_pfn;
    last_inuse_pfn
}
