//! Core enforcement engine

use chrono::{DateTime, Local, NaiveDate};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warden_api::{ServiceStatusSnapshot, TerminationReason, STATUS_VERSION};
use warden_config::{Policy, RuleConfig};
use warden_host_api::{HostError, HostResult, ProcessHost};
use warden_util::{HourWindow, ProcessId, RuleName};

use crate::{CoreEvent, ProcessLocator, Rule};

/// Outcome of killing a rule's processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationReport {
    pub reason: TerminationReason,
    pub killed: Vec<ProcessId>,
    pub failed: Vec<(ProcessId, String)>,
}

impl TerminationReport {
    /// Pids that are still alive after the attempt
    pub fn survivors(&self) -> BTreeSet<ProcessId> {
        self.failed.iter().map(|(pid, _)| *pid).collect()
    }
}

/// The enforcement engine.
///
/// Owns every rule and evaluates them against one process table snapshot
/// per tick. Time is always passed in, so the engine itself is
/// deterministic.
pub struct EnforcementEngine {
    rules: Vec<Rule>,
    global_window: Option<HourWindow>,
    host: Arc<dyn ProcessHost>,
    usage_day: Option<NaiveDate>,
    own_pid: Option<ProcessId>,
}

impl EnforcementEngine {
    /// Create a new engine from a validated policy
    pub fn new(policy: &Policy, host: Arc<dyn ProcessHost>) -> Self {
        Self::with_rules(&policy.rules, policy.daemon.allowed_hours, host)
    }

    pub fn with_rules(
        rules: &[RuleConfig],
        global_window: Option<HourWindow>,
        host: Arc<dyn ProcessHost>,
    ) -> Self {
        info!(
            rule_count = rules.len(),
            host = host.name(),
            global_window = ?global_window.map(|w| w.to_string()),
            "Enforcement engine initialized"
        );

        Self {
            rules: rules.iter().map(Rule::new).collect(),
            global_window,
            host,
            usage_day: None,
            own_pid: Some(ProcessId::new(std::process::id())),
        }
    }

    /// Pid that is never matched by any rule; defaults to the current process
    pub fn with_own_pid(mut self, pid: Option<ProcessId>) -> Self {
        self.own_pid = pid;
        self
    }

    /// Probe the process table once, so an unusable host fails at startup
    pub fn check_host(&self) -> HostResult<usize> {
        self.host.list_processes().map(|p| p.len())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Get a rule by name (case-insensitive)
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name().eq_ignore_case(name))
    }

    pub fn global_window(&self) -> Option<HourWindow> {
        self.global_window
    }

    /// Local day the current usage figures belong to
    pub fn usage_day(&self) -> Option<NaiveDate> {
        self.usage_day
    }

    /// Window in force for a rule: its own override, else the global one
    pub fn effective_window(&self, rule: &Rule) -> Option<HourWindow> {
        rule.allowed_hours().or(self.global_window)
    }

    /// Run one enforcement tick
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        self.check_daily_reset(now, &mut events);

        let locator = match self.host.list_processes() {
            Ok(entries) => ProcessLocator::from_snapshot(&entries),
            Err(e) => {
                warn!(error = %e, "Failed to read process table, treating all rules as not running");
                events.push(CoreEvent::ProcessScanFailed {
                    error: e.to_string(),
                });
                ProcessLocator::empty()
            }
        };
        debug!(processes = locator.len(), "Process table scanned");

        let global_window = self.global_window;
        for rule in &mut self.rules {
            let mut pids = locator.find(rule.name().as_str());
            if let Some(own) = self.own_pid
                && pids.remove(&own)
            {
                debug!(rule = %rule.name(), pid = %own, "Rule matches the daemon itself, skipping it");
            }
            let allowed = rule
                .allowed_hours()
                .or(global_window)
                .is_none_or(|w| w.allows(&now));

            let Some(reason) = rule.evaluate(pids, allowed, now, &mut events) else {
                continue;
            };

            let report = terminate(self.host.as_ref(), rule.name(), rule.kill_targets(), reason);
            rule.finish_termination(reason, &report.survivors());

            events.push(CoreEvent::TerminationIssued {
                rule: rule.name().clone(),
                reason,
                killed: report.killed,
                failed: report.failed.into_iter().map(|(pid, _)| pid).collect(),
            });
        }

        events
    }

    /// Zero every rule when the local calendar day advances.
    ///
    /// The first tick only records the day; a clock stepping back a day
    /// keeps the later day's usage.
    fn check_daily_reset(&mut self, now: DateTime<Local>, events: &mut Vec<CoreEvent>) {
        let today = now.date_naive();

        match self.usage_day {
            None => self.usage_day = Some(today),
            Some(previous) if today > previous => {
                for rule in &mut self.rules {
                    rule.reset();
                }
                self.usage_day = Some(today);

                info!(%previous, %today, "Daily usage reset");
                events.push(CoreEvent::DailyReset {
                    day: today,
                    previous,
                    rule_count: self.rules.len(),
                });
            }
            Some(_) => {}
        }
    }

    /// Build a status snapshot of every rule
    pub fn status(&self, now: DateTime<Local>) -> ServiceStatusSnapshot {
        ServiceStatusSnapshot {
            status_version: STATUS_VERSION,
            taken_at: now,
            usage_day: self.usage_day,
            global_allowed_hours: self.global_window,
            rules: self
                .rules
                .iter()
                .map(|r| r.status(now, self.effective_window(r)))
                .collect(),
        }
    }
}

/// Send a kill to every pid, recording success or failure per pid.
///
/// A pid that is already gone counts as killed.
pub fn terminate(
    host: &dyn ProcessHost,
    rule: &RuleName,
    pids: &BTreeSet<ProcessId>,
    reason: TerminationReason,
) -> TerminationReport {
    let mut killed = Vec::new();
    let mut failed = Vec::new();

    for &pid in pids {
        match host.kill(pid) {
            Ok(()) => {
                debug!(%rule, %pid, %reason, "Process killed");
                killed.push(pid);
            }
            Err(HostError::ProcessNotFound(_)) => {
                debug!(%rule, %pid, "Process already gone");
                killed.push(pid);
            }
            Err(e) => {
                warn!(%rule, %pid, error = %e, "Failed to kill process");
                failed.push((pid, e.to_string()));
            }
        }
    }

    TerminationReport {
        reason,
        killed,
        failed,
    }
}
