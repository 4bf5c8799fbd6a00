//! NØNOS Freestanding Hardware Entrypoint (src/main.rs)
//!
//! Minimal bare-metal entry point used when this crate is linked as a
//! standalone kernel image rather than pulled in as a library by the
//! rest of the NØNOS tree. It brings up serial logging and the kernel
//! heap only — paging, scheduling, and the rest of the boot sequence
//! live upstream of this crate's scope (see Out of Scope in the
//! compaction engine design). The panic handler lives in
//! `nonos_kernel_lib` (`lib.rs`); a freestanding binary and its library
//! can't each define one without a duplicate lang item at link time.

#![no_main]
#![no_std]

use nonos_kernel_lib::arch::x86_64::serial;
use nonos_kernel_lib::log;
use nonos_kernel_lib::memory::heap;

/// Hardware startup entry point.
#[no_mangle]
pub extern "C" fn _start() -> ! {
    serial::init();
    log::init_logger();
    heap::init_kernel_heap();
    log::log_info("[NONOS] compaction engine image online");

    loop {
        core::hint::spin_loop();
    }
}
