//! Mock host adapter for testing

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use warden_util::ProcessId;

use crate::{HostError, HostResult, ProcessEntry, ProcessHost};

/// Mock host adapter for unit/integration testing
///
/// Holds a fake process table. A successful [`ProcessHost::kill`] removes
/// the process from the table, like SIGKILL followed by reaping.
pub struct MockHost {
    next_pid: AtomicU32,
    table: Arc<Mutex<BTreeMap<ProcessId, ProcessEntry>>>,
    kills: Arc<Mutex<Vec<ProcessId>>>,

    /// Configure enumeration to fail
    pub fail_list: Arc<Mutex<bool>>,

    /// Pids whose kill should fail (the process survives)
    pub unkillable: Arc<Mutex<HashSet<ProcessId>>>,
}

/// First fake pid, above the kernel's PID_MAX_LIMIT so it never equals a real pid
const FIRST_MOCK_PID: u32 = 5_000_000;

impl MockHost {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(FIRST_MOCK_PID),
            table: Arc::new(Mutex::new(BTreeMap::new())),
            kills: Arc::new(Mutex::new(Vec::new())),
            fail_list: Arc::new(Mutex::new(false)),
            unkillable: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Start a fake process with the given command name
    pub fn spawn(&self, name: &str) -> ProcessId {
        let pid = ProcessId::new(self.next_pid.fetch_add(1, Ordering::SeqCst));
        self.insert(ProcessEntry::new(pid, name));
        pid
    }

    /// Insert a fully specified process entry
    pub fn insert(&self, entry: ProcessEntry) {
        self.table.lock().unwrap().insert(entry.pid, entry);
    }

    /// Simulate a process exiting on its own
    pub fn exit(&self, pid: ProcessId) {
        self.table.lock().unwrap().remove(&pid);
    }

    /// Simulate every process with this exact name exiting
    pub fn exit_all(&self, name: &str) {
        self.table.lock().unwrap().retain(|_, p| p.name != name);
    }

    /// Get the pids currently in the table
    pub fn running(&self) -> Vec<ProcessId> {
        self.table.lock().unwrap().keys().copied().collect()
    }

    /// Check whether a pid is still in the table
    pub fn is_running(&self, pid: ProcessId) -> bool {
        self.table.lock().unwrap().contains_key(&pid)
    }

    /// Every pid a kill was attempted on, in order
    pub fn kill_attempts(&self) -> Vec<ProcessId> {
        self.kills.lock().unwrap().clone()
    }

    /// Make kills of this pid fail
    pub fn make_unkillable(&self, pid: ProcessId) {
        self.unkillable.lock().unwrap().insert(pid);
    }

    /// Configure enumeration failures
    pub fn set_fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHost for MockHost {
    fn list_processes(&self) -> HostResult<Vec<ProcessEntry>> {
        if *self.fail_list.lock().unwrap() {
            return Err(HostError::EnumerationFailed("Mock enumeration failure".into()));
        }
        Ok(self.table.lock().unwrap().values().cloned().collect())
    }

    fn kill(&self, pid: ProcessId) -> HostResult<()> {
        self.kills.lock().unwrap().push(pid);

        if self.unkillable.lock().unwrap().contains(&pid) {
            return Err(HostError::PermissionDenied(pid));
        }

        match self.table.lock().unwrap().remove(&pid) {
            Some(_) => Ok(()),
            None => Err(HostError::ProcessNotFound(pid)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_spawn_and_kill() {
        let host = MockHost::new();
        let pid = host.spawn("discord");

        assert_eq!(host.list_processes().unwrap().len(), 1);

        host.kill(pid).unwrap();

        assert!(!host.is_running(pid));
        assert_eq!(host.kill_attempts(), vec![pid]);
    }

    #[test]
    fn mock_kill_missing_process() {
        let host = MockHost::new();
        let result = host.kill(ProcessId::new(1));
        assert!(matches!(result, Err(HostError::ProcessNotFound(_))));
    }

    #[test]
    fn mock_unkillable_process_survives() {
        let host = MockHost::new();
        let pid = host.spawn("stubborn");
        host.make_unkillable(pid);

        assert!(host.kill(pid).is_err());
        assert!(host.is_running(pid));
    }

    #[test]
    fn mock_enumeration_failure() {
        let host = MockHost::new();
        host.spawn("safari");
        host.set_fail_list(true);

        assert!(host.list_processes().is_err());
    }

    #[test]
    fn mock_exit_all_by_name() {
        let host = MockHost::new();
        host.spawn("safari");
        host.spawn("safari");
        let other = host.spawn("discord");

        host.exit_all("safari");

        assert_eq!(host.running(), vec![other]);
    }
}
