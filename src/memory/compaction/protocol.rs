//! Unmap/remap protocol — C6, §4.4.
//!
//! Keeps virtual-to-physical translations coherent around the
//! out-of-band bulk copy the DPU performs. Two phases: `unmap_phase`
//! runs before the move and blocks every translation behind a
//! placeholder; `remap_phase` runs after and swings each translation
//! (and the page-cache slot, if any) onto the new frame. Frames that
//! never moved (`old_pfn == new_pfn`) only need their LRU isolation and
//! page-lock released — there's nothing to swing.

use super::error::CompactError;
use super::fragment::Fragment;
use super::host::{Backing, PageHost, RmapHost, TlbHost};
use super::region::Region;

/// Installs migration placeholders over every in-use fragment that
/// will actually move. A fragment with no current virtual mapping has
/// nothing for a fault to block on, so it's left `was_mapped = false`
/// and its private buffer state is dropped instead. Fragments staying
/// in place are untouched — they were never unmapped in the first
/// place.
pub fn unmap_phase<H: PageHost + RmapHost>(host: &H, region: &mut Region) {
    for frag in region.fragments.iter_mut().filter(|f| f.is_in_use() && f.moves()) {
        if frag.anon {
            frag.anon_holder = Some(host.get_anon_rmap_holder(frag.old_pfn));
        }

        if !host.has_virtual_mapping(frag.old_pfn) {
            host.drop_private_buffers(frag.old_pfn);
            continue;
        }

        frag.was_mapped = host.install_migration_placeholders(frag.old_pfn);
    }
}

/// Reverts a single fragment to its pre-unmap state: reinstates the
/// original translation if a placeholder was installed, drops the
/// page-lock and LRU isolation, and releases the anon rmap holder.
/// Mirrors `recovery::abort`'s in-use branch, but for one fragment
/// mid-remap rather than a whole region — used when an individual
/// fragment's destination can't be locked or its mapping-table swing
/// fails (§7 `DestinationLockFailure` / `MappingSwingFailure`); the
/// region itself carries on with the remaining fragments.
fn rollback_fragment<H: PageHost + RmapHost>(host: &H, frag: &Fragment, err: CompactError) {
    crate::log::log_warn(&alloc::format!(
        "remap: fragment {:#x} -> {:#x} rolled back: {}",
        frag.old_pfn, frag.new_pfn, err
    ));
    if frag.was_mapped {
        host.reinstate_original(frag.old_pfn);
    }
    host.unlock_page(frag.old_pfn);
    host.putback_lru(frag.old_pfn);
    if let Some(handle) = frag.anon_holder {
        host.release_anon_rmap_holder(handle);
    }
}

/// Swings every moved in-use fragment's mapping onto its new frame,
/// drops LRU isolation and page locks for everything in-use, and
/// issues one TLB flush at the end covering the whole region.
///
/// Per-fragment failures (destination can't be locked, or an atomic
/// page-cache swing fails) don't abort the region: the offending
/// fragment rolls back via `rollback_fragment` and the rest proceed,
/// per spec §7's propagation policy. Returns the number of fragments
/// that had to roll back this way.
pub fn remap_phase<H: PageHost + RmapHost + TlbHost>(host: &H, region: &Region) -> usize {
    let mut rolled_back = 0;

    for frag in region.fragments.iter().filter(|f| f.is_in_use()) {
        if !frag.moves() {
            host.unlock_page(frag.old_pfn);
            host.putback_lru(frag.old_pfn);
            continue;
        }

        let (old_pfn, new_pfn) = (frag.old_pfn, frag.new_pfn);

        if host.try_lock_page(new_pfn).is_err() {
            rollback_fragment(host, frag, CompactError::DestinationLockFailure);
            rolled_back += 1;
            continue;
        }

        let swing_result = match host.backing(old_pfn) {
            Backing::File => host.migrate_mapping_table_entry(old_pfn, new_pfn),
            Backing::Anon => {
                host.copy_mapping_and_index(old_pfn, new_pfn);
                host.mark_swap_backed(new_pfn);
                Ok(())
            }
        };

        if swing_result.is_err() {
            host.unlock_page(new_pfn);
            rollback_fragment(host, frag, CompactError::MappingSwingFailure);
            rolled_back += 1;
            continue;
        }

        host.copy_page_flags(old_pfn, new_pfn);
        host.insert_lru(new_pfn);

        if frag.was_mapped {
            host.resolve_migration_placeholders(old_pfn, new_pfn);
        }
        host.unlock_page(new_pfn);
        host.unlock_page(old_pfn);

        if let Some(handle) = frag.anon_holder {
            host.release_anon_rmap_holder(handle);
        }
    }

    host.flush_tlb_all();
    rolled_back
}
