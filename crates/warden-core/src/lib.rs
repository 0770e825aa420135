//! Core enforcement engine and rule state machine for wardend
//!
//! This crate is the heart of wardend, containing:
//! - Process location (matching application names against the process table)
//! - Rule state machine (Idle -> Running -> GraceExceeded -> Idle)
//! - Access window gating and daily usage reset
//! - Forceful termination and the fixed-cadence scheduler

mod engine;
mod events;
mod locator;
mod rule;
mod scheduler;

pub use engine::*;
pub use events::*;
pub use locator::*;
pub use rule::*;
pub use scheduler::*;
