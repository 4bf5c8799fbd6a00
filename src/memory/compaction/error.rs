//! Error kinds — §7.
//!
//! Per-frame errors (isolation, per-fragment remap) are recovered
//! locally by their caller and never escape as a `CompactError`; this
//! enum is for the cases that end a region's attempt outright.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactError {
    /// Region is already holding `MAX_FRAGMENTS`; not fatal by itself,
    /// the walker simply stops early and planning proceeds with what
    /// was collected.
    NoCapacity,
    /// Couldn't allocate a fragment record.
    AllocationFailure,
    /// LRU or page-lock acquisition lost a race; the frame in question
    /// was skipped by the caller, not a region-ending condition.
    IsolationFailure,
    /// A component ran against a region in the wrong state, or an empty
    /// fragment set reached the planner. Caller bug — surfaced as
    /// `Failed`.
    PlannerPrecondition,
    /// The accelerator reported failure. Region transitions to `Failed`
    /// and is rolled back in full.
    AcceleratorError,
    /// Atomic page-cache slot swing failed mid-remap for one fragment;
    /// only that fragment rolls back, the region continues.
    MappingSwingFailure,
    /// Destination frame couldn't be locked during remap; same
    /// per-fragment rollback as `MappingSwingFailure`.
    DestinationLockFailure,
}

impl fmt::Display for CompactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompactError::NoCapacity => "region at capacity",
            CompactError::AllocationFailure => "fragment record allocation failed",
            CompactError::IsolationFailure => "isolation lost a race",
            CompactError::PlannerPrecondition => "region not in a plannable state",
            CompactError::AcceleratorError => "accelerator reported failure",
            CompactError::MappingSwingFailure => "mapping table swing failed",
            CompactError::DestinationLockFailure => "destination frame lock failed",
        };
        f.write_str(s)
    }
}
