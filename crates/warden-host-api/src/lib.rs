//! Host adapter trait interfaces for wardend
//!
//! This crate defines the capability-based interface between the enforcement
//! core and platform-specific implementations. It contains no platform code
//! itself; [`MockHost`] backs the tests with a deterministic process table.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
