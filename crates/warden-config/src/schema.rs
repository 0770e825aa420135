//! Raw configuration schema (as parsed from TOML or the command line)

use serde::{Deserialize, Serialize};
use warden_util::WardenError;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Monitored applications, in enforcement order
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

impl RawConfig {
    /// An empty configuration at the current version, for CLI-only setups
    pub fn empty() -> Self {
        Self {
            config_version: crate::CURRENT_CONFIG_VERSION,
            daemon: RawDaemonConfig::default(),
            rules: Vec::new(),
        }
    }
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Enforcement tick interval in milliseconds (default: 1000)
    pub poll_interval_ms: Option<u64>,

    /// Global access window applied to rules without their own
    pub allowed_hours: Option<RawHourWindow>,
}

/// Raw rule definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRule {
    /// Application name matched against process names
    pub name: String,

    /// Budget as a duration string ("90m", "1h30m")
    pub time_limit: Option<String>,

    /// Budget in seconds
    pub time_limit_seconds: Option<u64>,

    /// Per-rule access window; replaces the global one
    pub allowed_hours: Option<RawHourWindow>,
}

impl RawRule {
    /// Parse a command-line rule spec: `NAME=LIMIT` or `NAME=LIMIT@START-END`
    pub fn from_cli_spec(spec: &str) -> Result<Self, WardenError> {
        let (name, rest) = spec
            .rsplit_once('=')
            .ok_or_else(|| WardenError::rule_spec(spec, "expected NAME=LIMIT"))?;

        let (limit, hours) = match rest.split_once('@') {
            Some((limit, hours)) => (limit, Some(RawHourWindow::Text(hours.trim().to_string()))),
            None => (rest, None),
        };

        if limit.trim().is_empty() {
            return Err(WardenError::rule_spec(spec, "missing time limit"));
        }

        Ok(Self {
            name: name.trim().to_string(),
            time_limit: Some(limit.trim().to_string()),
            time_limit_seconds: None,
            allowed_hours: hours,
        })
    }
}

/// Hour window as written by the operator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawHourWindow {
    /// "9-17"
    Text(String),
    /// { start = 9, end = 17 }
    Range { start: u32, end: u32 },
}

impl std::fmt::Display for RawHourWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawHourWindow::Text(s) => write!(f, "{}", s),
            RawHourWindow::Range { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}
