//! Unix host adapter for wardend
//!
//! Provides:
//! - Process table snapshots from /proc (zombies excluded)
//! - A `ps`-based snapshot where /proc is unavailable
//! - Forceful (SIGKILL) termination of single processes

mod adapter;
mod procfs;
mod ps;
mod signal;

pub use adapter::*;
pub use procfs::*;
pub use ps::*;
pub use signal::*;
