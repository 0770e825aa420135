//! Validated policy structures

use crate::schema::{RawConfig, RawDaemonConfig, RawRule};
use crate::validation::{resolve_hour_window, resolve_time_limit};
use std::time::Duration;
use warden_util::{HourWindow, RuleName};

/// Default enforcement tick interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Validated policy ready for use by the enforcement engine
#[derive(Debug, Clone)]
pub struct Policy {
    /// Daemon configuration
    pub daemon: DaemonConfig,

    /// Validated rules, in configuration order
    pub rules: Vec<RuleConfig>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub(crate) fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonConfig::from_raw(raw.daemon),
            rules: raw.rules.into_iter().filter_map(RuleConfig::from_raw).collect(),
        }
    }

    /// Get rule by name (case-insensitive)
    pub fn get_rule(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.iter().find(|r| r.name.eq_ignore_case(name))
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub poll_interval: Duration,

    /// Global access window; None means no time-of-day restriction
    pub allowed_hours: Option<HourWindow>,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            poll_interval: raw
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            allowed_hours: raw
                .allowed_hours
                .as_ref()
                .and_then(|w| resolve_hour_window(w).ok()),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            allowed_hours: None,
        }
    }
}

/// Validated rule definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub name: RuleName,
    pub time_limit: Duration,

    /// Own access window; replaces (never combines with) the global one
    pub allowed_hours: Option<HourWindow>,
}

impl RuleConfig {
    pub fn new(name: impl Into<RuleName>, time_limit: Duration) -> Self {
        Self {
            name: name.into(),
            time_limit,
            allowed_hours: None,
        }
    }

    pub fn with_allowed_hours(mut self, window: HourWindow) -> Self {
        self.allowed_hours = Some(window);
        self
    }

    // Validation has already rejected rules this would drop
    fn from_raw(raw: RawRule) -> Option<Self> {
        let time_limit = resolve_time_limit(&raw).ok()?;
        let allowed_hours = match &raw.allowed_hours {
            Some(window) => Some(resolve_hour_window(window).ok()?),
            None => None,
        };

        Some(Self {
            name: RuleName::new(raw.name.trim()),
            time_limit,
            allowed_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawHourWindow;

    #[test]
    fn test_defaults() {
        let policy = Policy::from_raw(RawConfig {
            config_version: 1,
            daemon: RawDaemonConfig::default(),
            rules: vec![RawRule {
                name: " Safari ".into(),
                time_limit: None,
                time_limit_seconds: Some(3600),
                allowed_hours: None,
            }],
        });

        assert_eq!(policy.daemon.poll_interval, Duration::from_secs(1));
        assert!(policy.daemon.allowed_hours.is_none());
        assert_eq!(policy.rules[0].name.as_str(), "Safari");
        assert_eq!(policy.rules[0].time_limit, Duration::from_secs(3600));
    }

    #[test]
    fn test_get_rule_ignores_case() {
        let policy = Policy::from_raw(RawConfig {
            config_version: 1,
            daemon: RawDaemonConfig {
                poll_interval_ms: Some(250),
                allowed_hours: Some(RawHourWindow::Range { start: 9, end: 17 }),
            },
            rules: vec![RawRule {
                name: "Discord".into(),
                time_limit: Some("30m".into()),
                time_limit_seconds: None,
                allowed_hours: Some(RawHourWindow::Text("15-20".into())),
            }],
        });

        let rule = policy.get_rule("discord").unwrap();
        assert_eq!(rule.allowed_hours, Some(HourWindow::new(15, 20).unwrap()));
        assert_eq!(policy.daemon.allowed_hours, Some(HourWindow::new(9, 17).unwrap()));
        assert_eq!(policy.daemon.poll_interval, Duration::from_millis(250));
        assert!(policy.get_rule("slack").is_none());
    }
}
