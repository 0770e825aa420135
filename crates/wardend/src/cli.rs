//! Command-line arguments and policy assembly

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info};
use warden_config::{
    build_policy, load_raw_config, ConfigError, Policy, RawConfig, RawHourWindow, RawRule,
};
use warden_util::{default_config_path, format_duration};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// wardend - Per-application daily time budgets and access windows
#[derive(Parser, Debug)]
#[command(name = "wardend")]
#[command(about = "Per-application daily time budgets and access windows", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.config/appwarden/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Monitor an application: NAME=LIMIT or NAME=LIMIT@START-END (repeatable)
    #[arg(short, long = "rule", value_name = "NAME=LIMIT")]
    pub rules: Vec<String>,

    /// Global allowed hours for rules without their own, e.g. 9-17
    #[arg(long, value_name = "START-END")]
    pub allowed_hours: Option<String>,

    /// Enforcement tick interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Validate the configuration, print the rule set and exit
    #[arg(long)]
    pub check: bool,

    /// Print a systemd user unit running wardend with these arguments and exit
    #[arg(long, conflicts_with = "check")]
    pub print_unit: bool,
}

impl Args {
    /// Merge the config file and command-line overrides into a validated policy.
    ///
    /// Without `--config`, a missing default file is not an error.
    pub fn load_policy(&self) -> Result<Policy> {
        let mut raw = match &self.config {
            Some(path) => load_raw_config(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    load_raw_config(&path)
                        .with_context(|| format!("Failed to load config from {}", path.display()))?
                } else {
                    debug!(path = %path.display(), "No config file, using command-line rules only");
                    RawConfig::empty()
                }
            }
        };

        for spec in &self.rules {
            let rule = RawRule::from_cli_spec(spec)
                .with_context(|| format!("Invalid --rule '{}'", spec))?;
            raw.rules.push(rule);
        }

        if let Some(hours) = &self.allowed_hours {
            raw.daemon.allowed_hours = Some(RawHourWindow::Text(hours.clone()));
        }

        if let Some(ms) = self.interval_ms {
            raw.daemon.poll_interval_ms = Some(ms);
        }

        match build_policy(raw) {
            Ok(policy) => Ok(policy),
            Err(ConfigError::ValidationFailed { errors }) => {
                for err in &errors {
                    error!(error = %err, "Configuration error");
                }
                bail!("Configuration is invalid ({} error(s))", errors.len())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Log the effective rule set
pub fn log_policy(policy: &Policy) {
    info!(
        rule_count = policy.rules.len(),
        interval_ms = policy.daemon.poll_interval.as_millis() as u64,
        allowed_hours = %policy
            .daemon
            .allowed_hours
            .map(|w| w.to_string())
            .unwrap_or_else(|| "any".into()),
        "Configuration loaded"
    );

    for rule in &policy.rules {
        debug!(
            rule = %rule.name,
            limit = %format_duration(rule.time_limit),
            allowed_hours = ?rule.allowed_hours.map(|w| w.to_string()),
            "Rule"
        );
    }
}

/// Human-readable rule set for `--check`
pub fn describe_policy(policy: &Policy) -> String {
    let mut out = String::new();
    let global = policy
        .daemon
        .allowed_hours
        .map(|w| w.to_string())
        .unwrap_or_else(|| "any".into());

    out.push_str(&format!(
        "Poll interval: {}ms\nGlobal allowed hours: {}\nRules ({}):\n",
        policy.daemon.poll_interval.as_millis(),
        global,
        policy.rules.len()
    ));

    for rule in &policy.rules {
        let hours = match rule.allowed_hours {
            Some(w) => w.to_string(),
            None => format!("{} (global)", global),
        };
        out.push_str(&format!(
            "  - {}: {} per day, allowed {}\n",
            rule.name,
            format_duration(rule.time_limit),
            hours
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("wardend").chain(argv.iter().copied()))
    }

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn cli_rules_with_config_file() {
        let file = config_file(
            "config_version = 1\n\n[daemon]\nallowed_hours = \"9-17\"\n\n[[rules]]\nname = \"Safari\"\ntime_limit = \"1h\"\n",
        );
        let path = file.path().to_str().unwrap();

        let policy = args(&["--config", path, "--rule", "Discord=30m@18-22", "--interval-ms", "500"])
            .load_policy()
            .unwrap();

        assert_eq!(policy.rules.len(), 2);
        assert_eq!(policy.rules[1].name.as_str(), "Discord");
        assert_eq!(policy.daemon.poll_interval, Duration::from_millis(500));
        assert_eq!(policy.daemon.allowed_hours.unwrap().to_string(), "09:00-17:00");
    }

    #[test]
    fn allowed_hours_flag_overrides_file() {
        let file = config_file(
            "config_version = 1\n\n[daemon]\nallowed_hours = \"9-17\"\n\n[[rules]]\nname = \"Safari\"\ntime_limit_seconds = 60\n",
        );
        let path = file.path().to_str().unwrap();

        let policy = args(&["-c", path, "--allowed-hours", "8-20"])
            .load_policy()
            .unwrap();
        assert_eq!(policy.daemon.allowed_hours.unwrap().to_string(), "08:00-20:00");
    }

    #[test]
    fn inverted_window_is_rejected() {
        let file = config_file(
            "config_version = 1\n\n[[rules]]\nname = \"Safari\"\ntime_limit_seconds = 60\n",
        );
        let path = file.path().to_str().unwrap();

        assert!(args(&["-c", path, "--allowed-hours", "17-9"]).load_policy().is_err());
    }

    #[test]
    fn malformed_rule_spec_is_rejected() {
        let file = config_file("config_version = 1\n");
        let path = file.path().to_str().unwrap();

        assert!(args(&["-c", path, "--rule", "Safari"]).load_policy().is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let result = args(&["-c", path.to_str().unwrap(), "--rule", "Safari=1h"]).load_policy();
        assert!(result.is_err());
    }

    #[test]
    fn describe_lists_rules() {
        let file = config_file(
            "config_version = 1\n\n[[rules]]\nname = \"Safari\"\ntime_limit = \"1h30m\"\nallowed_hours = { start = 8, end = 20 }\n",
        );
        let path = file.path().to_str().unwrap();

        let policy = args(&["-c", path, "--rule", "Discord=45m"]).load_policy().unwrap();
        let text = describe_policy(&policy);

        assert!(text.contains("Rules (2):"));
        assert!(text.contains("Safari"));
        assert!(text.contains("08:00-20:00"));
        assert!(text.contains("any (global)"));
    }

    #[test]
    fn print_unit_conflicts_with_check() {
        let result = Args::try_parse_from(["wardend", "--check", "--print-unit"]);
        assert!(result.is_err());
    }
}
