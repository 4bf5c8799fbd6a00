//! Kernel heap initialization.
//!
//! `alloc` (used throughout `compaction` for `Vec`/`BTreeMap`/`format!`)
//! needs exactly one `#[global_allocator]` registered in whatever binary
//! ultimately links this crate in; when `nonos_kernel` is built as the
//! freestanding image (`main.rs`), that's here. A consumer linking
//! `nonos_kernel_lib` into a larger kernel instead provides its own and
//! never pulls this module in.

use linked_list_allocator::LockedHeap;

/// Static bounds for the heap. Matches the teacher project's reserved
/// high-half scratch region; real placement belongs to the paging setup
/// this crate doesn't own (spec §1 out-of-scope: the host frame
/// allocator).
pub const HEAP_START: usize = 0x_4444_0000;
pub const HEAP_SIZE: usize = 1024 * 1024 * 2; // 2 MiB

#[global_allocator]
static KERNEL_HEAP: LockedHeap = LockedHeap::empty();

/// Initializes the global heap. Must run before any `alloc` call.
pub fn init_kernel_heap() {
    unsafe {
        KERNEL_HEAP.lock().init(HEAP_START as *mut u8, HEAP_SIZE);
    }
    crate::log::log_info("[HEAP] kernel heap initialized");
}

#[alloc_error_handler]
fn alloc_error(layout: core::alloc::Layout) -> ! {
    crate::log::log_fatal("[HEAP] allocation failure");
    panic!("out of memory: {:?}", layout);
}
