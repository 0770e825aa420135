//! Shared types for wardend status reporting

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_util::{HourWindow, ProcessId, RuleName};

/// Externally visible state of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleState {
    /// No matching process, no session
    Idle,
    /// Session active, under budget
    Running,
    /// Budget exhausted, counting down to termination
    GraceExceeded,
    /// A termination left survivors; the next sighting kills again
    KillPending,
}

impl fmt::Display for RuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleState::Idle => "idle",
            RuleState::Running => "running",
            RuleState::GraceExceeded => "grace_exceeded",
            RuleState::KillPending => "kill_pending",
        };
        f.write_str(s)
    }
}

/// Why processes were terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The in-flight total crossed the budget on this tick
    TimeLimitReached,
    /// The grace period after an exhausted budget ran out
    GracePeriodExpired,
    /// The current hour is outside the rule's access window
    OutsideAllowedHours,
}

impl TerminationReason {
    /// Whether the termination was caused by the usage budget
    pub fn is_budget(&self) -> bool {
        matches!(
            self,
            TerminationReason::TimeLimitReached | TerminationReason::GracePeriodExpired
        )
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::TimeLimitReached => "time limit reached",
            TerminationReason::GracePeriodExpired => "grace period expired",
            TerminationReason::OutsideAllowedHours => "outside allowed hours",
        };
        f.write_str(s)
    }
}

/// Why a usage session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEndReason {
    /// Every matching process went away on its own
    ProcessExited,
    /// The daemon terminated the processes
    Terminated { reason: TerminationReason },
}

/// Status of one rule at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStatus {
    pub name: RuleName,
    pub state: RuleState,
    pub time_limit_secs: u64,
    /// Committed plus in-flight seconds
    pub used_secs: u64,
    pub remaining_secs: u64,
    pub session_started_at: Option<DateTime<Local>>,
    pub process_ids: Vec<ProcessId>,
    /// Window in force for this rule (own override or the global one)
    pub allowed_hours: Option<HourWindow>,
}

/// Snapshot of the whole enforcement state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatusSnapshot {
    pub status_version: u32,
    pub taken_at: DateTime<Local>,
    /// Local day the usage figures belong to
    pub usage_day: Option<NaiveDate>,
    pub global_allowed_hours: Option<HourWindow>,
    pub rules: Vec<RuleStatus>,
}
