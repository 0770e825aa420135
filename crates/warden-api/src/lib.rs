//! Status types for wardend
//!
//! This crate defines the serializable view of the enforcement state that
//! the daemon reports to operators:
//! - Rule states and termination reasons
//! - Per-rule status and whole-service snapshots

mod types;

pub use types::*;

/// Status schema version, bumped on incompatible snapshot changes
pub const STATUS_VERSION: u32 = 1;
