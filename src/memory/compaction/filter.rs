//! Suitability filter — C3, §4.1.
//!
//! Pure predicate, no side effects. Delegates the actual per-page
//! metadata checks to the host, since this crate has no inherent
//! knowledge of page flags; the filter's job is naming the rule, not
//! owning the bits.

use super::fragment::Pfn;
use super::host::PageHost;

/// A frame is suitable for in-use migration iff the host agrees it's
/// movable (`PageHost::is_suitable_for_migration`) and not itself
/// sitting free in the buddy allocator — free frames take the buddy
/// path in the walker, never this one.
pub fn is_suitable<H: PageHost>(host: &H, pfn: Pfn) -> bool {
    if host.is_buddy_free(pfn) {
        return false;
    }
    host.is_suitable_for_migration(pfn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::compaction::host::fake::FakeHost;

    #[test]
    fn plain_in_use_frame_is_suitable() {
        let host = FakeHost::new();
        host.add_in_use(1000, 1);
        assert!(is_suitable(&host, 1000));
    }

    #[test]
    fn huge_page_is_unsuitable() {
        let host = FakeHost::new();
        host.add_in_use(1000, 1);
        host.mark_unsuitable(1000, true, false, false, false);
        assert!(!is_suitable(&host, 1000));
    }

    #[test]
    fn writeback_page_is_unsuitable() {
        let host = FakeHost::new();
        host.add_in_use(1000, 1);
        host.mark_unsuitable(1000, false, false, true, false);
        assert!(!is_suitable(&host, 1000));
    }

    #[test]
    fn ksm_page_is_unsuitable() {
        let host = FakeHost::new();
        host.add_in_use(1000, 1);
        host.mark_unsuitable(1000, false, true, false, false);
        assert!(!is_suitable(&host, 1000));
    }

    #[test]
    fn unevictable_page_is_unsuitable() {
        let host = FakeHost::new();
        host.add_in_use(1000, 1);
        host.mark_unsuitable(1000, false, false, false, true);
        assert!(!is_suitable(&host, 1000));
    }

    #[test]
    fn free_frame_is_never_suitable_here() {
        let host = FakeHost::new();
        host.add_free(1000);
        assert!(!is_suitable(&host, 1000));
    }
}
