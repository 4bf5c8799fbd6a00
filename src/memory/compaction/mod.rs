//! DPU-offloaded physical memory compaction engine.
//!
//! Given a window of physical frames, this walks it once (`walker`),
//! decides where everything in-use should end up (`planner`), keeps
//! virtual translations coherent around an out-of-band bulk copy the
//! DPU performs (`protocol`, `dpu`), and either tears the region down
//! cleanly or unwinds it in full (`recovery`). `hook::try_compact` is
//! the only entry point a caller needs.

pub mod config;
pub mod dpu;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod hook;
pub mod host;
pub mod planner;
pub mod protocol;
pub mod recovery;
pub mod region;
pub mod walker;

pub use error::CompactError;
pub use fragment::{Fragment, Kind, Pfn};
pub use hook::{try_compact, CompactFlags, CompactOutcome};
pub use host::{Accelerator, AnonRmapHandle, Backing, PageHost, RmapHost, TlbHost};
pub use region::{Region, State};
