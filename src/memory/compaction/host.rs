//! Collaborator contracts — §6.
//!
//! Everything the compaction engine needs from "the host" (frame
//! allocator, LRU, reverse-map subsystem, TLB flush, the DPU driver)
//! is named here as a trait instead of being implemented in this
//! crate — those subsystems are explicitly out of scope (spec §1).
//! A `#[cfg(test)]` fake backs all four traits with an in-memory model
//! so the engine's own logic (C1–C9) can be driven and checked without
//! a real kernel underneath it, the same separation of hardware
//! contract from concrete backend used by HAL-style crates elsewhere
//! in this project's lineage.

use alloc::vec::Vec;

use super::error::CompactError;
use super::fragment::Pfn;

/// Opaque handle keeping an anonymous reverse-map descriptor alive
/// across a move. Not a pointer — this crate never assumes anything
/// about the handle's representation besides identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnonRmapHandle(pub u64);

/// Whether a frame's backing object is file/page-cache or anonymous,
/// as seen by `migrate_mapping_table_entry` vs. the plain
/// mapping/index copy path in the remap protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    File,
    Anon,
}

/// Frame allocator + LRU + page-lock + per-page metadata surface —
/// §4.1, §4.2, §4.4, §6.
pub trait PageHost {
    /// `pfn_valid` and zone match combined: is this PFN a real frame in
    /// the zone the walker is scanning?
    fn is_valid(&self, pfn: Pfn) -> bool;

    /// Is this frame currently sitting in the buddy free-list?
    fn is_buddy_free(&self, pfn: Pfn) -> bool;

    /// Order of the free block this PFN belongs to. Only meaningful
    /// when `is_buddy_free` is true.
    fn buddy_order(&self, pfn: Pfn) -> u32;

    /// Takes the whole free block containing `pfn` (at `order`) out of
    /// the allocator.
    fn isolate_free_block_at(&self, pfn: Pfn, order: u32) -> Result<(), CompactError>;

    /// Splits a previously-isolated free block into single-frame
    /// pieces, returned base-PFN ascending.
    fn split_to_single_frames(&self, base_pfn: Pfn, order: u32) -> Vec<Pfn>;

    /// Returns a single isolated frame to the allocator's free list.
    fn release_frame(&self, pfn: Pfn);

    /// §4.1 suitability predicate.
    fn is_suitable_for_migration(&self, pfn: Pfn) -> bool;

    fn isolate_lru(&self, pfn: Pfn) -> Result<(), CompactError>;
    fn putback_lru(&self, pfn: Pfn);
    fn insert_lru(&self, pfn: Pfn);

    fn try_lock_page(&self, pfn: Pfn) -> Result<(), CompactError>;
    fn unlock_page(&self, pfn: Pfn);

    fn is_anon(&self, pfn: Pfn) -> bool;
    fn is_dirty(&self, pfn: Pfn) -> bool;
    fn backing(&self, pfn: Pfn) -> Backing;
    fn has_virtual_mapping(&self, pfn: Pfn) -> bool;

    fn copy_page_flags(&self, src: Pfn, dst: Pfn);
    fn copy_mapping_and_index(&self, src: Pfn, dst: Pfn);
    fn mark_swap_backed(&self, pfn: Pfn);

    fn get_anon_rmap_holder(&self, pfn: Pfn) -> AnonRmapHandle;
    fn release_anon_rmap_holder(&self, handle: AnonRmapHandle);

    /// Reference count observed on a frame; used by tests to check
    /// invariant 5 of spec §8 (conservation across the move).
    fn refcount(&self, pfn: Pfn) -> u64;

    fn drop_private_buffers(&self, pfn: Pfn);
}

/// Reverse-map subsystem — §4.4, §6. The engine never touches rmap
/// data directly, only through these calls.
pub trait RmapHost {
    /// Replaces every PTE mapping `pfn` with a non-present migration
    /// placeholder. Returns whether any mapping existed at all (this
    /// becomes `Fragment::was_mapped`).
    fn install_migration_placeholders(&self, pfn: Pfn) -> bool;

    /// Resolves every placeholder originally installed for `old_pfn`
    /// into a present PTE pointing at `new_pfn`.
    fn resolve_migration_placeholders(&self, old_pfn: Pfn, new_pfn: Pfn);

    /// Reinstates the original translation for a fragment whose remap
    /// never completed — the failure-path mirror of
    /// `resolve_migration_placeholders`.
    fn reinstate_original(&self, pfn: Pfn);

    /// Atomically swings a page-cache slot from `old_pfn` to `new_pfn`,
    /// transferring the cache refcount in one step.
    fn migrate_mapping_table_entry(&self, old_pfn: Pfn, new_pfn: Pfn) -> Result<(), CompactError>;
}

/// Ordering and cache-coherence primitives — §5, §6.
pub trait TlbHost {
    fn flush_tlb_all(&self);
    fn write_barrier(&self);
    fn dma_sync_for_cpu(&self);
}

/// The DPU wire contract — §6: `dpu_move(src_pfn[], dst_pfn[], count)`.
pub trait Accelerator {
    /// `moves` is `(src, dst)` pairs. On `Ok`, every source has been
    /// fully copied to its destination and is visible to the CPU once
    /// the caller issues a write-barrier + DMA sync.
    fn dpu_move(&self, moves: &[(Pfn, Pfn)]) -> Result<(), CompactError>;
}
