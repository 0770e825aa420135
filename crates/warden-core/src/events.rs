//! Core events emitted by the engine

use chrono::NaiveDate;
use std::time::Duration;
use warden_api::{SessionEndReason, TerminationReason};
use warden_util::{ProcessId, RuleName};

/// Events emitted by the core engine, one per state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A matching process appeared and a usage session began
    SessionStarted {
        rule: RuleName,
        used_secs: u64,
        remaining_secs: u64,
        process_count: usize,
    },

    /// A usage session ended and its time was committed
    SessionEnded {
        rule: RuleName,
        session_secs: u64,
        elapsed_secs: u64,
        reason: SessionEndReason,
    },

    /// The budget is exhausted and the grace countdown began
    GraceStarted {
        rule: RuleName,
        elapsed_secs: u64,
        time_limit_secs: u64,
        grace: Duration,
    },

    /// The processes exited on their own before the grace period ran out
    GraceCancelled { rule: RuleName },

    /// Kill signals were sent
    TerminationIssued {
        rule: RuleName,
        reason: TerminationReason,
        killed: Vec<ProcessId>,
        failed: Vec<ProcessId>,
    },

    /// Usage counters were zeroed for a new day
    DailyReset {
        day: NaiveDate,
        previous: NaiveDate,
        rule_count: usize,
    },

    /// The process table could not be read; every rule was treated as not running
    ProcessScanFailed { error: String },
}

impl CoreEvent {
    /// Rule the event concerns, if any
    pub fn rule(&self) -> Option<&RuleName> {
        match self {
            CoreEvent::SessionStarted { rule, .. }
            | CoreEvent::SessionEnded { rule, .. }
            | CoreEvent::GraceStarted { rule, .. }
            | CoreEvent::GraceCancelled { rule }
            | CoreEvent::TerminationIssued { rule, .. } => Some(rule),
            CoreEvent::DailyReset { .. } | CoreEvent::ProcessScanFailed { .. } => None,
        }
    }
}
