//! Logging of engine events and status snapshots

use tracing::{info, warn};
use warden_api::{ServiceStatusSnapshot, TerminationReason};
use warden_core::{CoreEvent, EventSink};

/// Reports every engine event through the log
#[derive(Debug, Default)]
pub struct EventReporter {
    kills: u64,
}

impl EventReporter {
    /// Number of processes killed since startup
    pub fn kills(&self) -> u64 {
        self.kills
    }
}

impl EventSink for EventReporter {
    fn event(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::SessionStarted {
                rule,
                used_secs,
                remaining_secs,
                process_count,
            } => {
                info!(
                    rule = %rule,
                    used_secs,
                    remaining_secs,
                    pids = process_count,
                    "Session started"
                );
            }

            CoreEvent::SessionEnded {
                rule,
                session_secs,
                elapsed_secs,
                reason,
            } => {
                info!(
                    rule = %rule,
                    session_secs,
                    elapsed_secs,
                    reason = ?reason,
                    "Session ended"
                );
            }

            CoreEvent::GraceStarted {
                rule,
                elapsed_secs,
                time_limit_secs,
                grace,
            } => {
                info!(
                    rule = %rule,
                    elapsed_secs,
                    time_limit_secs,
                    grace_secs = grace.as_secs(),
                    "Time limit exceeded, terminating after grace period"
                );
            }

            CoreEvent::GraceCancelled { rule } => {
                info!(rule = %rule, "Application closed during grace period");
            }

            CoreEvent::TerminationIssued {
                rule,
                reason,
                killed,
                failed,
            } => {
                self.kills += killed.len() as u64;

                let message = match reason {
                    TerminationReason::OutsideAllowedHours => "Blocked outside allowed hours",
                    TerminationReason::TimeLimitReached => "Time limit reached, processes killed",
                    TerminationReason::GracePeriodExpired => "Grace period expired, processes killed",
                };

                if failed.is_empty() {
                    info!(rule = %rule, %reason, killed = ?killed, "{}", message);
                } else {
                    warn!(
                        rule = %rule,
                        %reason,
                        killed = ?killed,
                        failed = ?failed,
                        "{}; some processes survived and will be retried",
                        message
                    );
                }
            }

            CoreEvent::DailyReset {
                day,
                previous,
                rule_count,
            } => {
                info!(%day, %previous, rule_count, "Daily usage reset");
            }

            CoreEvent::ProcessScanFailed { error } => {
                warn!(error = %error, "Process table scan failed");
            }
        }
    }

    fn status(&mut self, snapshot: &ServiceStatusSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => info!(status = %json, kills = self.kills, "Status snapshot"),
            Err(e) => warn!(error = %e, "Failed to serialize status snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_util::{ProcessId, RuleName};

    #[test]
    fn counts_killed_processes() {
        let mut reporter = EventReporter::default();

        reporter.event(&CoreEvent::TerminationIssued {
            rule: RuleName::new("Safari"),
            reason: TerminationReason::TimeLimitReached,
            killed: vec![ProcessId::new(1), ProcessId::new(2)],
            failed: vec![ProcessId::new(3)],
        });
        reporter.event(&CoreEvent::GraceCancelled {
            rule: RuleName::new("Safari"),
        });

        assert_eq!(reporter.kills(), 2);
    }
}
