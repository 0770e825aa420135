//! Process termination

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;
use warden_host_api::{HostError, HostResult};
use warden_util::ProcessId;

/// Send SIGKILL to a single process
pub fn kill_process(pid: ProcessId) -> HostResult<()> {
    let raw = i32::try_from(pid.as_u32()).map_err(|_| HostError::KillFailed {
        pid,
        message: "pid out of range".into(),
    })?;

    // pid 0 and negative pids address process groups
    if raw <= 0 {
        return Err(HostError::KillFailed {
            pid,
            message: "refusing to signal a process group".into(),
        });
    }

    match signal::kill(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => {
            debug!(%pid, "Sent SIGKILL");
            Ok(())
        }
        Err(Errno::ESRCH) => Err(HostError::ProcessNotFound(pid)),
        Err(Errno::EPERM) => Err(HostError::PermissionDenied(pid)),
        Err(e) => Err(HostError::KillFailed {
            pid,
            message: format!("Failed to send SIGKILL: {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn kill_child_process() {
        let mut child = Command::new("sleep").arg("60").spawn().unwrap();
        let pid = ProcessId::new(child.id());

        kill_process(pid).unwrap();

        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[test]
    fn reject_process_group_pid() {
        let result = kill_process(ProcessId::new(0));
        assert!(matches!(result, Err(HostError::KillFailed { .. })));
    }

    #[test]
    fn reaped_process_is_not_found() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = ProcessId::new(child.id());
        child.wait().unwrap();

        assert!(matches!(
            kill_process(pid),
            Err(HostError::ProcessNotFound(_))
        ));
    }
}
