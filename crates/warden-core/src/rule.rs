//! Per-application rule state machine

use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;
use warden_api::{RuleState, RuleStatus, SessionEndReason, TerminationReason};
use warden_config::RuleConfig;
use warden_util::{seconds_between, HourWindow, ProcessId, RuleName};

use crate::CoreEvent;

/// How long an over-budget application may keep running before it is killed
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Internal phase of a rule.
///
/// At most one of a session start and a grace start exists at a time,
/// which the enum shape enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePhase {
    /// Not running, or not being tracked
    Idle,
    /// Usage session open since the given instant
    Running { since: DateTime<Local> },
    /// Budget exhausted, kill due once the grace period has passed
    Grace { since: DateTime<Local> },
    /// Only survivors of a failed budget kill remain; they are killed again every tick
    KillPending,
}

/// One monitored application with its daily budget and usage
#[derive(Debug, Clone)]
pub struct Rule {
    name: RuleName,
    time_limit_secs: u64,
    allowed_hours: Option<HourWindow>,

    /// Committed usage for the current day
    elapsed_secs: u64,
    phase: RulePhase,

    /// Pids seen on the most recent evaluation
    process_ids: BTreeSet<ProcessId>,

    /// Survivors of a failed budget kill, retried without a grace period
    pending_kill: BTreeSet<ProcessId>,

    /// Pids the last verdict from `evaluate` applies to
    kill_targets: BTreeSet<ProcessId>,
}

impl Rule {
    pub fn new(config: &RuleConfig) -> Self {
        Self {
            name: config.name.clone(),
            time_limit_secs: config.time_limit.as_secs(),
            allowed_hours: config.allowed_hours,
            elapsed_secs: 0,
            phase: RulePhase::Idle,
            process_ids: BTreeSet::new(),
            pending_kill: BTreeSet::new(),
            kill_targets: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &RuleName {
        &self.name
    }

    pub fn time_limit_secs(&self) -> u64 {
        self.time_limit_secs
    }

    /// The rule's own access window, if it overrides the global one
    pub fn allowed_hours(&self) -> Option<HourWindow> {
        self.allowed_hours
    }

    /// Committed seconds, excluding any open session
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn phase(&self) -> RulePhase {
        self.phase
    }

    pub fn process_ids(&self) -> &BTreeSet<ProcessId> {
        &self.process_ids
    }

    /// Survivors of an earlier budget kill that are still being retried
    pub fn pending_kill(&self) -> &BTreeSet<ProcessId> {
        &self.pending_kill
    }

    /// Pids to terminate when `evaluate` returned a reason
    pub fn kill_targets(&self) -> &BTreeSet<ProcessId> {
        &self.kill_targets
    }

    pub fn state(&self) -> RuleState {
        match self.phase {
            RulePhase::Idle => RuleState::Idle,
            RulePhase::Running { .. } => RuleState::Running,
            RulePhase::Grace { .. } => RuleState::GraceExceeded,
            RulePhase::KillPending => RuleState::KillPending,
        }
    }

    /// Committed usage has reached the budget
    pub fn is_exceeded(&self) -> bool {
        self.elapsed_secs >= self.time_limit_secs
    }

    /// Committed plus in-flight usage
    pub fn used_secs(&self, now: DateTime<Local>) -> u64 {
        match self.phase {
            RulePhase::Running { since } => self
                .elapsed_secs
                .saturating_add(seconds_between(since, now)),
            _ => self.elapsed_secs,
        }
    }

    pub fn remaining_secs(&self, now: DateTime<Local>) -> u64 {
        self.time_limit_secs.saturating_sub(self.used_secs(now))
    }

    /// Advance the state machine by one observation.
    ///
    /// `pids` are the matching processes seen this tick and `allowed` says
    /// whether the effective access window admits the current hour.
    /// Returns the reason to terminate `kill_targets()` if a kill is due.
    pub fn evaluate(
        &mut self,
        pids: BTreeSet<ProcessId>,
        allowed: bool,
        now: DateTime<Local>,
        events: &mut Vec<CoreEvent>,
    ) -> Option<TerminationReason> {
        self.process_ids = pids;
        self.kill_targets.clear();

        if self.process_ids.is_empty() {
            match self.phase {
                RulePhase::Running { .. } => {
                    self.end_session(now, SessionEndReason::ProcessExited, events);
                }
                RulePhase::Grace { .. } | RulePhase::KillPending => {
                    debug!(rule = %self.name, "Processes gone before grace expired");
                    events.push(CoreEvent::GraceCancelled {
                        rule: self.name.clone(),
                    });
                }
                RulePhase::Idle => {}
            }
            self.phase = RulePhase::Idle;
            self.pending_kill.clear();
            return None;
        }

        if !allowed {
            let reason = TerminationReason::OutsideAllowedHours;
            self.end_session(now, SessionEndReason::Terminated { reason }, events);
            self.phase = RulePhase::Idle;
            self.kill_targets = self.process_ids.clone();
            return Some(reason);
        }

        if self.is_exceeded() {
            return self.evaluate_exceeded(now, events);
        }

        let since = match self.phase {
            RulePhase::Running { since } => since,
            _ => {
                self.phase = RulePhase::Running { since: now };
                debug!(
                    rule = %self.name,
                    pids = self.process_ids.len(),
                    used = self.elapsed_secs,
                    "Session started"
                );
                events.push(CoreEvent::SessionStarted {
                    rule: self.name.clone(),
                    used_secs: self.elapsed_secs,
                    remaining_secs: self.remaining_secs(now),
                    process_count: self.process_ids.len(),
                });
                now
            }
        };

        let total = self.elapsed_secs.saturating_add(seconds_between(since, now));
        if total >= self.time_limit_secs {
            let reason = TerminationReason::TimeLimitReached;
            self.end_session(now, SessionEndReason::Terminated { reason }, events);
            self.phase = RulePhase::Idle;
            self.kill_targets = self.process_ids.clone();
            return Some(reason);
        }

        None
    }

    fn evaluate_exceeded(
        &mut self,
        now: DateTime<Local>,
        events: &mut Vec<CoreEvent>,
    ) -> Option<TerminationReason> {
        let seen = &self.process_ids;
        self.pending_kill.retain(|pid| seen.contains(pid));
        let has_fresh = seen.iter().any(|pid| !self.pending_kill.contains(pid));

        match self.phase {
            RulePhase::Grace { since } => {
                if seconds_between(since, now) >= GRACE_PERIOD.as_secs() {
                    self.kill_targets = self.process_ids.clone();
                    return Some(TerminationReason::GracePeriodExpired);
                }
            }
            RulePhase::Idle | RulePhase::Running { .. } | RulePhase::KillPending if has_fresh => {
                self.end_session(now, SessionEndReason::ProcessExited, events);
                self.phase = RulePhase::Grace { since: now };
                debug!(rule = %self.name, "Over budget, grace period started");
                events.push(CoreEvent::GraceStarted {
                    rule: self.name.clone(),
                    elapsed_secs: self.elapsed_secs,
                    time_limit_secs: self.time_limit_secs,
                    grace: GRACE_PERIOD,
                });
            }
            RulePhase::Idle | RulePhase::Running { .. } | RulePhase::KillPending => {
                self.end_session(now, SessionEndReason::ProcessExited, events);
                self.phase = RulePhase::KillPending;
            }
        }

        if self.pending_kill.is_empty() {
            return None;
        }

        // Newcomers keep their grace; only earlier survivors are hit now
        self.kill_targets = self.pending_kill.clone();
        Some(TerminationReason::GracePeriodExpired)
    }

    /// Fold an open session into the committed total
    fn end_session(
        &mut self,
        now: DateTime<Local>,
        reason: SessionEndReason,
        events: &mut Vec<CoreEvent>,
    ) {
        let RulePhase::Running { since } = self.phase else {
            return;
        };

        let session_secs = seconds_between(since, now);
        self.elapsed_secs = self.elapsed_secs.saturating_add(session_secs);
        self.phase = RulePhase::Idle;

        debug!(
            rule = %self.name,
            session_secs,
            elapsed = self.elapsed_secs,
            "Session ended"
        );
        events.push(CoreEvent::SessionEnded {
            rule: self.name.clone(),
            session_secs,
            elapsed_secs: self.elapsed_secs,
            reason,
        });
    }

    /// Record the outcome of a termination of `kill_targets()`.
    ///
    /// `survivors` are the pids whose kill failed. Survivors of a budget
    /// kill are retried on every following tick; pids still in grace keep it.
    pub fn finish_termination(&mut self, reason: TerminationReason, survivors: &BTreeSet<ProcessId>) {
        let targets = std::mem::take(&mut self.kill_targets);
        self.process_ids
            .retain(|pid| !targets.contains(pid) || survivors.contains(pid));

        self.pending_kill = if reason.is_budget() {
            survivors.clone()
        } else {
            BTreeSet::new()
        };

        let pending = &self.pending_kill;
        let in_grace = matches!(self.phase, RulePhase::Grace { .. })
            && self.process_ids.iter().any(|pid| !pending.contains(pid));
        if !in_grace {
            self.phase = if pending.is_empty() {
                RulePhase::Idle
            } else {
                RulePhase::KillPending
            };
        }
    }

    /// Zero usage for a new day
    pub fn reset(&mut self) {
        self.elapsed_secs = 0;
        self.phase = RulePhase::Idle;
        self.process_ids.clear();
        self.pending_kill.clear();
        self.kill_targets.clear();
    }

    pub fn status(&self, now: DateTime<Local>, effective_window: Option<HourWindow>) -> RuleStatus {
        let session_started_at = match self.phase {
            RulePhase::Running { since } => Some(since),
            _ => None,
        };

        RuleStatus {
            name: self.name.clone(),
            state: self.state(),
            time_limit_secs: self.time_limit_secs,
            used_secs: self.used_secs(now),
            remaining_secs: self.remaining_secs(now),
            session_started_at,
            process_ids: self.process_ids.iter().copied().collect(),
            allowed_hours: effective_window,
        }
    }
}
