//! Process table snapshots via `ps`, for systems without procfs

use std::path::Path;
use std::process::Command;
use warden_host_api::{HostError, HostResult, ProcessEntry};
use warden_util::ProcessId;

/// Snapshot every live process by running `ps`
pub fn ps_snapshot() -> HostResult<Vec<ProcessEntry>> {
    run_ps("ps")
}

fn run_ps(program: &str) -> HostResult<Vec<ProcessEntry>> {
    let output = Command::new(program)
        .args(["-axo", "pid=,state=,comm="])
        .output()?;

    if !output.status.success() {
        return Err(HostError::EnumerationFailed(format!(
            "ps exited with {}",
            output.status
        )));
    }

    Ok(parse_ps_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `pid state comm` lines, dropping zombies and malformed lines
pub fn parse_ps_output(text: &str) -> Vec<ProcessEntry> {
    text.lines().filter_map(parse_ps_line).collect()
}

fn parse_ps_line(line: &str) -> Option<ProcessEntry> {
    let (pid, rest) = line.trim_start().split_once(char::is_whitespace)?;
    let pid: u32 = pid.parse().ok()?;

    let (state, comm) = rest.trim_start().split_once(char::is_whitespace)?;
    if state.starts_with('Z') {
        return None;
    }

    let comm = comm.trim();
    let name = Path::new(comm)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| comm.to_string());
    if name.is_empty() {
        return None;
    }

    Some(ProcessEntry::new(ProcessId::new(pid), name))
}
