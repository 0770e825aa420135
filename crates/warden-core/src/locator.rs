//! Process location by application name

use std::collections::BTreeSet;
use warden_host_api::ProcessEntry;
use warden_util::ProcessId;

/// Matches application names against one snapshot of the process table.
///
/// Matching is case-insensitive against each process's short name and
/// executable basename. Exact matches win; only when nothing matches
/// exactly does a substring match apply, which catches truncated or
/// suffixed names such as `Discord Helper`.
#[derive(Debug, Clone, Default)]
pub struct ProcessLocator {
    processes: Vec<(ProcessId, Vec<String>)>,
}

impl ProcessLocator {
    /// Build a locator over a process table snapshot
    pub fn from_snapshot(entries: &[ProcessEntry]) -> Self {
        let processes = entries
            .iter()
            .map(|entry| {
                let names = entry.match_names().map(str::to_lowercase).collect();
                (entry.pid, names)
            })
            .collect();

        Self { processes }
    }

    /// A locator that sees no processes
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of processes in the snapshot
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Find the pids matching an application name
    pub fn find(&self, app_name: &str) -> BTreeSet<ProcessId> {
        let needle = app_name.trim().to_lowercase();
        if needle.is_empty() {
            return BTreeSet::new();
        }

        let exact = self.collect(|name| name == needle);
        if !exact.is_empty() {
            return exact;
        }

        self.collect(|name| name.contains(needle.as_str()))
    }

    fn collect(&self, matches: impl Fn(&str) -> bool) -> BTreeSet<ProcessId> {
        self.processes
            .iter()
            .filter(|(_, names)| names.iter().any(|n| matches(n)))
            .map(|(pid, _)| *pid)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pids(raw: &[u32]) -> BTreeSet<ProcessId> {
        raw.iter().copied().map(ProcessId::new).collect()
    }

    fn table() -> Vec<ProcessEntry> {
        vec![
            ProcessEntry::new(100u32, "Safari"),
            ProcessEntry::new(101u32, "Safari Networking"),
            ProcessEntry::new(200u32, "Discord Helper"),
            ProcessEntry::new(201u32, "Discord Helper (GPU)"),
            ProcessEntry::new(300u32, "Web Content").with_command("firefox"),
            ProcessEntry::new(400u32, "bash"),
        ]
    }

    #[test]
    fn exact_match_is_case_insensitive_and_wins() {
        let locator = ProcessLocator::from_snapshot(&table());

        // "Safari Networking" also contains "safari" but an exact match exists
        assert_eq!(locator.find("safari"), pids(&[100]));
        assert_eq!(locator.find("SAFARI"), pids(&[100]));
    }

    #[test]
    fn substring_fallback_when_no_exact_match() {
        let locator = ProcessLocator::from_snapshot(&table());
        assert_eq!(locator.find("Discord"), pids(&[200, 201]));
    }

    #[test]
    fn matches_executable_basename() {
        let locator = ProcessLocator::from_snapshot(&table());
        assert_eq!(locator.find("Firefox"), pids(&[300]));
    }

    #[test]
    fn no_match_is_empty() {
        let locator = ProcessLocator::from_snapshot(&table());
        assert!(locator.find("Slack").is_empty());
        assert!(locator.find("   ").is_empty());
    }

    #[test]
    fn empty_snapshot_finds_nothing() {
        let locator = ProcessLocator::empty();
        assert!(locator.is_empty());
        assert!(locator.find("Safari").is_empty());
    }
}
