//! Configuration validation

use crate::schema::{RawConfig, RawHourWindow, RawRule};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use warden_util::{HourWindow, parse_duration};

/// Smallest accepted tick interval
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Largest accepted tick interval
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Rule '{rule}': {message}")]
    RuleError { rule: String, message: String },

    #[error("Duplicate rule name: {0}")]
    DuplicateRuleName(String),

    #[error("Invalid allowed_hours '{value}' for {scope}: {message}")]
    InvalidHourWindow {
        scope: String,
        value: String,
        message: String,
    },

    #[error("poll_interval_ms {0} is out of range (100-60000)")]
    InvalidPollInterval(u64),

    #[error("No rules configured")]
    NoRules,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.rules.is_empty() {
        errors.push(ValidationError::NoRules);
    }

    if let Some(ms) = config.daemon.poll_interval_ms
        && !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&ms)
    {
        errors.push(ValidationError::InvalidPollInterval(ms));
    }

    if let Some(window) = &config.daemon.allowed_hours
        && let Err(message) = resolve_hour_window(window)
    {
        errors.push(ValidationError::InvalidHourWindow {
            scope: "daemon".into(),
            value: window.to_string(),
            message,
        });
    }

    // Names are matched case-insensitively, so duplicates are too
    let mut seen_names = HashSet::new();
    for rule in &config.rules {
        if !rule.name.trim().is_empty() && !seen_names.insert(rule.name.trim().to_lowercase()) {
            errors.push(ValidationError::DuplicateRuleName(rule.name.clone()));
        }
    }

    for rule in &config.rules {
        errors.extend(validate_rule(rule));
    }

    errors
}

fn validate_rule(rule: &RawRule) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if rule.name.trim().is_empty() {
        errors.push(ValidationError::RuleError {
            rule: rule.name.clone(),
            message: "name cannot be empty".into(),
        });
    }

    if let Err(message) = resolve_time_limit(rule) {
        errors.push(ValidationError::RuleError {
            rule: rule.name.clone(),
            message,
        });
    }

    if let Some(window) = &rule.allowed_hours
        && let Err(message) = resolve_hour_window(window)
    {
        errors.push(ValidationError::InvalidHourWindow {
            scope: format!("rule '{}'", rule.name),
            value: window.to_string(),
            message,
        });
    }

    errors
}

/// Resolve a rule's budget from whichever field is set
pub fn resolve_time_limit(rule: &RawRule) -> Result<Duration, String> {
    let limit = match (&rule.time_limit, rule.time_limit_seconds) {
        (Some(_), Some(_)) => {
            return Err("set either time_limit or time_limit_seconds, not both".into());
        }
        (None, None) => return Err("missing time_limit".into()),
        (Some(text), None) => parse_duration(text).map_err(|e| e.to_string())?,
        (None, Some(secs)) => Duration::from_secs(secs),
    };

    if limit.is_zero() {
        return Err("time limit must be greater than zero".into());
    }

    Ok(limit)
}

/// Resolve an hour window in either accepted form
pub fn resolve_hour_window(raw: &RawHourWindow) -> Result<HourWindow, String> {
    match raw {
        RawHourWindow::Text(text) => text
            .parse::<HourWindow>()
            .map_err(|e| e.to_string()),
        RawHourWindow::Range { start, end } => {
            let start = u8::try_from(*start).map_err(|_| "start hour must be 0-23".to_string())?;
            let end = u8::try_from(*end).map_err(|_| "end hour must be 1-24".to_string())?;
            HourWindow::new(start, end).map_err(|e| e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawDaemonConfig;

    fn rule(name: &str, limit: &str) -> RawRule {
        RawRule {
            name: name.into(),
            time_limit: Some(limit.into()),
            time_limit_seconds: None,
            allowed_hours: None,
        }
    }

    fn config_with(rules: Vec<RawRule>) -> RawConfig {
        RawConfig {
            config_version: 1,
            daemon: RawDaemonConfig::default(),
            rules,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = config_with(vec![rule("Safari", "1h"), rule("Discord", "30m")]);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_duplicate_name_detection_ignores_case() {
        let config = config_with(vec![rule("Safari", "1h"), rule("safari", "2h")]);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateRuleName(_))));
    }

    #[test]
    fn test_empty_rule_set_rejected() {
        let errors = validate_config(&config_with(vec![]));
        assert_eq!(errors, vec![ValidationError::NoRules]);
    }

    #[test]
    fn test_hour_window_rejections() {
        for (start, end) in [(17, 9), (9, 9), (24, 24), (0, 25), (300, 301)] {
            let raw = RawHourWindow::Range { start, end };
            assert!(resolve_hour_window(&raw).is_err(), "{}-{} should be rejected", start, end);
        }

        assert!(resolve_hour_window(&RawHourWindow::Text("0-24".into())).is_ok());
        assert!(resolve_hour_window(&RawHourWindow::Text("23-24".into())).is_ok());
    }

    #[test]
    fn test_time_limit_resolution() {
        assert_eq!(resolve_time_limit(&rule("a", "90m")).unwrap(), Duration::from_secs(5400));

        let mut both = rule("a", "1h");
        both.time_limit_seconds = Some(60);
        assert!(resolve_time_limit(&both).is_err());

        let mut neither = rule("a", "1h");
        neither.time_limit = None;
        assert!(resolve_time_limit(&neither).is_err());

        assert!(resolve_time_limit(&rule("a", "0")).is_err());
        assert!(resolve_time_limit(&rule("a", "soon")).is_err());
    }

    #[test]
    fn test_collects_every_error() {
        let mut bad_window = rule("Discord", "30m");
        bad_window.allowed_hours = Some(RawHourWindow::Text("18-9".into()));

        let mut config = config_with(vec![rule("", "1h"), rule("Safari", "0"), bad_window]);
        config.daemon.poll_interval_ms = Some(5);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidPollInterval(5)));
    }
}
