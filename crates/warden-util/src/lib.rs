//! Shared utilities for wardend
//!
//! This crate provides:
//! - ID types (RuleName, ProcessId)
//! - Time utilities (mockable wall clock, hour windows, duration parsing)
//! - Error types
//! - Default paths for configuration

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
