//! Strongly-typed identifiers for wardend

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a monitored application, as configured by the operator.
///
/// Matching against process names is case-insensitive; the configured
/// spelling is kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleName(String);

impl RuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for matching and duplicate detection
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive equality with another name
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.folded() == other.to_lowercase()
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RuleName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// OS process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    pub fn new(pid: u32) -> Self {
        Self(pid)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        Self(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_name_case_insensitive_equality() {
        let name = RuleName::new("Safari");
        assert!(name.eq_ignore_case("safari"));
        assert!(name.eq_ignore_case("SAFARI"));
        assert!(!name.eq_ignore_case("Safari Technology Preview"));
        assert_eq!(name.as_str(), "Safari");
    }

    #[test]
    fn process_ids_order_numerically() {
        let mut pids = vec![ProcessId::new(300), ProcessId::new(7), ProcessId::new(42)];
        pids.sort();
        assert_eq!(pids, vec![ProcessId::new(7), ProcessId::new(42), ProcessId::new(300)]);
    }

    #[test]
    fn ids_serialize_deserialize() {
        let name = RuleName::new("Discord");
        let json = serde_json::to_string(&name).unwrap();
        let parsed: RuleName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, parsed);

        let pid = ProcessId::new(4242);
        let json = serde_json::to_string(&pid).unwrap();
        assert_eq!(json, "4242");
    }
}
