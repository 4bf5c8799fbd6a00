//! NØNOS Logging Subsystem — backend implementation.
//!
//! A single global logger, backed by the 16550 serial port
//! (`arch::x86_64::serial`), guarded by a spinlock so it is safe to call
//! from any context that isn't itself holding the port. Every other
//! module in this crate reaches it through `try_get_logger()` rather
//! than touching the serial port directly, the same pattern used
//! throughout the pre-transform NØNOS tree (`memory::frame_alloc`,
//! `memory::region`).

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

use crate::arch::x86_64::serial;

/// Severity of a single log line, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Minimum severity the logger will emit.
#[derive(Debug, Clone, Copy)]
pub struct LogLevel(Severity);

impl LogLevel {
    pub const fn new(min: Severity) -> Self {
        LogLevel(min)
    }

    fn allows(&self, sev: Severity) -> bool {
        sev >= self.0
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::new(Severity::Debug)
    }
}

/// The logger itself. One instance, global, lazily initialized.
pub struct Logger {
    level: Mutex<LogLevel>,
}

/// Set once a panic is in flight; downgrades the internal lock from
/// blocking to try-lock so a panic inside a held lock can't deadlock
/// the only way the kernel has left to report it.
static PANIC_MODE: AtomicBool = AtomicBool::new(false);

static LOGGER: Logger = Logger {
    level: Mutex::new(LogLevel::new(Severity::Debug)),
};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

impl Logger {
    /// Default entry point used by call sites that don't care about
    /// severity — logged at `Info`.
    pub fn log(&self, msg: &str) {
        self.log_at(Severity::Info, msg);
    }

    pub fn log_at(&self, sev: Severity, msg: &str) {
        let min = if PANIC_MODE.load(Ordering::Acquire) {
            match self.level.try_lock() {
                Some(l) => *l,
                None => LogLevel::default(),
            }
        } else {
            *self.level.lock()
        };

        if !min.allows(sev) {
            return;
        }

        let prefix = match sev {
            Severity::Debug => "[DBG]",
            Severity::Info => "[INFO]",
            Severity::Warn => "[WARN]",
            Severity::Error => "[ERR]",
            Severity::Fatal => "[FATAL]",
        };

        self.write_line(prefix, msg);
    }

    fn write_line(&self, prefix: &str, msg: &str) {
        if PANIC_MODE.load(Ordering::Acquire) {
            // Best-effort: never block while panicking.
            if let Some(serial) = unsafe { serial::get_serial() } {
                let _ = write!(serial, "{} {}\n", prefix, msg);
            }
            return;
        }
        unsafe {
            if let Some(serial) = serial::get_serial() {
                let _ = write!(serial, "{} {}\n", prefix, msg);
            }
        }
    }

    pub fn set_level(&self, min: Severity) {
        *self.level.lock() = LogLevel::new(min);
    }
}

/// Initialize the logging subsystem. Idempotent.
pub fn init() {
    INITIALIZED.store(true, Ordering::Release);
}

/// Returns the global logger once `init()` has run, `None` before.
pub fn try_get_logger() -> Option<&'static Logger> {
    if INITIALIZED.load(Ordering::Acquire) {
        Some(&LOGGER)
    } else {
        None
    }
}

/// Called by the panic handler before it touches anything else.
pub fn enter_panic_mode() {
    PANIC_MODE.store(true, Ordering::SeqCst);
}

pub fn log(msg: &str) {
    if let Some(l) = try_get_logger() {
        l.log_at(Severity::Info, msg);
    }
}

pub fn log_info(msg: &str) {
    if let Some(l) = try_get_logger() {
        l.log_at(Severity::Info, msg);
    }
}

pub fn log_warn(msg: &str) {
    if let Some(l) = try_get_logger() {
        l.log_at(Severity::Warn, msg);
    }
}

pub fn log_err(msg: &str) {
    if let Some(l) = try_get_logger() {
        l.log_at(Severity::Error, msg);
    }
}

pub fn log_dbg(msg: &str) {
    if let Some(l) = try_get_logger() {
        l.log_at(Severity::Debug, msg);
    }
}

pub fn log_fatal(msg: &str) {
    if let Some(l) = try_get_logger() {
        l.log_at(Severity::Fatal, msg);
    } else {
        // No logger yet (e.g. panic during early boot) — fall straight
        // through to the serial port.
        unsafe {
            if let Some(serial) = serial::get_serial() {
                let _ = write!(serial, "[FATAL] {}\n", msg);
            }
        }
    }
}
