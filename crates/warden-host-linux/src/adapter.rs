//! Unix host adapter implementation

use tracing::{debug, info};
use warden_host_api::{HostResult, ProcessEntry, ProcessHost};
use warden_util::ProcessId;

use crate::{kill_process, ps_snapshot, ProcfsReader};

#[derive(Debug, Clone)]
enum Source {
    Procfs(ProcfsReader),
    Ps,
}

/// Host adapter for Linux and other Unix systems.
///
/// Snapshots come from procfs when it is mounted, otherwise from `ps`.
#[derive(Debug, Clone)]
pub struct LinuxHost {
    source: Source,
}

impl LinuxHost {
    pub fn new() -> Self {
        let reader = ProcfsReader::new();
        if reader.is_available() {
            debug!(root = %reader.root().display(), "Using procfs for process snapshots");
            Self::with_procfs(reader)
        } else {
            info!("procfs not available, falling back to ps");
            Self { source: Source::Ps }
        }
    }

    /// Read snapshots from a specific procfs tree
    pub fn with_procfs(reader: ProcfsReader) -> Self {
        Self {
            source: Source::Procfs(reader),
        }
    }
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHost for LinuxHost {
    fn list_processes(&self) -> HostResult<Vec<ProcessEntry>> {
        match &self.source {
            Source::Procfs(reader) => reader.snapshot(),
            Source::Ps => ps_snapshot(),
        }
    }

    fn kill(&self, pid: ProcessId) -> HostResult<()> {
        kill_process(pid)
    }

    fn name(&self) -> &'static str {
        match self.source {
            Source::Procfs(_) => "procfs",
            Source::Ps => "ps",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn list_and_kill_child() {
        let host = LinuxHost::new();
        let mut child = Command::new("sleep").arg("60").spawn().unwrap();
        let pid = ProcessId::new(child.id());

        let entries = host.list_processes().unwrap();
        let entry = entries.iter().find(|e| e.pid == pid).unwrap();
        assert!(entry.match_names().any(|n| n == "sleep"));

        host.kill(pid).unwrap();
        child.wait().unwrap();

        let entries = host.list_processes().unwrap();
        assert!(!entries.iter().any(|e| e.pid == pid));
    }

    #[test]
    fn fake_procfs_root() {
        let root = tempfile::tempdir().unwrap();
        let host = LinuxHost::with_procfs(ProcfsReader::with_root(root.path()));

        assert_eq!(host.name(), "procfs");
        assert!(host.list_processes().unwrap().is_empty());
    }
}
