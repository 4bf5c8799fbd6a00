//! Region controller — C2, §3, §4.6.
//!
//! Owns the fragment set for one aligned physical window and the
//! lifecycle state machine. Exactly one thread owns a region from
//! creation to cleanup (spec §5): every method here assumes `&mut
//! self` and takes no internal lock of its own. The per-region
//! spinlock spec §5 describes for the fragment list during C4 lives in
//! `walker`, which is the only stage that needs concurrent append.

use alloc::vec::Vec;

use super::config::MAX_FRAGMENTS;
use super::error::CompactError;
use super::fragment::{Fragment, Kind, Pfn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Collecting,
    Moving,
    Updating,
    Complete,
    Failed,
}

impl State {
    /// Valid state machine edges, §4.6. Invalid transitions are
    /// programming errors — the caller is expected to treat a `false`
    /// here as a reason to panic, not to retry.
    fn can_advance_to(self, next: State) -> bool {
        matches!(
            (self, next),
            (State::Idle, State::Collecting)
                | (State::Collecting, State::Moving)
                | (State::Collecting, State::Failed)
                | (State::Moving, State::Updating)
                | (State::Moving, State::Failed)
                | (State::Updating, State::Complete)
                | (State::Updating, State::Failed)
        )
    }
}

pub struct Region {
    pub base_pfn: Pfn,
    pub size_pfns: u64,
    pub fragments: Vec<Fragment>,
    pub state: State,
    /// Highest `new_pfn` assigned to an `InUse` record by the planner;
    /// `None` until the planner has run.
    pub last_inuse_pfn: Option<Pfn>,
}

impl Region {
    pub fn new(base_pfn: Pfn, size_pfns: u64) -> Self {
        Region {
            base_pfn,
            size_pfns,
            fragments: Vec::new(),
            state: State::Idle,
            last_inuse_pfn: None,
        }
    }

    /// Advances `state`. Panics on an invalid transition per §4.6 —
    /// "invalid transitions are programming errors (fail loud)".
    pub fn advance(&mut self, next: State) {
        assert!(
            self.state.can_advance_to(next),
            "invalid region state transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    pub fn is_full(&self) -> bool {
        self.fragments.len() >= MAX_FRAGMENTS
    }

    /// Appends a fragment. Caller (the walker) must have already
    /// established the invariants described in §4.2's contract before
    /// calling this.
    pub fn push_fragment(&mut self, frag: Fragment) -> Result<(), CompactError> {
        if self.is_full() {
            return Err(CompactError::NoCapacity);
        }
        debug_assert!(frag.old_pfn >= self.base_pfn && frag.old_pfn < self.base_pfn + self.size_pfns);
        debug_assert!(self.fragments.iter().all(|f| f.old_pfn != frag.old_pfn));
        self.fragments.push(frag);
        Ok(())
    }

    pub fn in_use_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_in_use()).count()
    }

    pub fn free_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_free()).count()
    }

    /// Checks invariants 1-5 of spec §8 against the current fragment
    /// set. Intended for tests and debug assertions, not the hot path.
    #[cfg(test)]
    pub fn check_invariants(&self) {
        assert!(self.fragments.len() <= MAX_FRAGMENTS);

        let mut old_pfns: Vec<Pfn> = self.fragments.iter().map(|f| f.old_pfn).collect();
        old_pfns.sort_unstable();
        old_pfns.dedup();
        assert_eq!(old_pfns.len(), self.fragments.len(), "old_pfn values must be pairwise distinct");

        for f in &self.fragments {
            assert!(f.old_pfn >= self.base_pfn && f.old_pfn < self.base_pfn + self.size_pfns);
        }

        if self.last_inuse_pfn.is_some() || self.fragments.iter().all(|f| f.new_pfn == f.old_pfn) {
            let mut new_pfns: Vec<Pfn> = self.fragments.iter().map(|f| f.new_pfn).collect();
            let mut old_pfns_multiset: Vec<Pfn> = self.fragments.iter().map(|f| f.old_pfn).collect();
            new_pfns.sort_unstable();
            old_pfns_multiset.sort_unstable();
            assert_eq!(new_pfns, old_pfns_multiset, "new_pfn must be a permutation of old_pfn");

            let max_in_use = self
                .fragments
                .iter()
                .filter(|f| f.is_in_use())
                .map(|f| f.new_pfn)
                .max();
            let min_free = self
                .fragments
                .iter()
                .filter(|f| f.is_free())
                .map(|f| f.new_pfn)
                .min();
            if let (Some(max_in_use), Some(min_free)) = (max_in_use, min_free) {
                assert!(max_in_use < min_free, "in-use frames must precede free frames after planning");
            }
        }
    }

    /// Diagnostic dump of the old->new mapping, mirroring
    /// `dpu_print_fragment_mapping` in the original source — logged,
    /// not printed, and gated by severity like everything else here.
    pub fn log_mapping(&self) {
        crate::log::log_info(&alloc::format!(
            "region [{:#x}, {:#x}): {} fragments ({} in-use, {} free)",
            self.base_pfn,
            self.base_pfn + self.size_pfns,
            self.fragments.len(),
            self.in_use_count(),
            self.free_count(),
        ));
        for f in &self.fragments {
            if f.moves() {
                crate::log::logger::log_dbg(&alloc::format!(
                    "  {:#x} -> {:#x} ({:?}) MIGRATE",
                    f.old_pfn, f.new_pfn, f.kind
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_region_is_idle() {
        let r = Region::new(1000, 512);
        assert_eq!(r.state, State::Idle);
        assert_eq!(r.fragments.len(), 0);
    }

    #[test]
    fn valid_transitions_succeed() {
        let mut r = Region::new(1000, 512);
        r.advance(State::Collecting);
        r.advance(State::Moving);
        r.advance(State::Updating);
        r.advance(State::Complete);
    }

    #[test]
    #[should_panic(expected = "invalid region state transition")]
    fn invalid_transition_panics() {
        let mut r = Region::new(1000, 512);
        r.advance(State::Moving);
    }

    #[test]
    fn push_fragment_rejects_when_full() {
        let mut r = Region::new(0, 4096);
        for i in 0..MAX_FRAGMENTS as u64 {
            r.push_fragment(Fragment::new(i, Kind::Free, false, false)).unwrap();
        }
        assert!(r.is_full());
        let err = r.push_fragment(Fragment::new(MAX_FRAGMENTS as u64, Kind::Free, false, false));
        assert_eq!(err, Err(CompactError::NoCapacity));
    }
}
