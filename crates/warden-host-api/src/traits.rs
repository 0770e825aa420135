//! Host adapter traits

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_util::ProcessId;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Process enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("Kill failed for pid {pid}: {message}")]
    KillFailed { pid: ProcessId, message: String },

    #[error("Permission denied for pid {0}")]
    PermissionDenied(ProcessId),

    #[error("No such process: {0}")]
    ProcessNotFound(ProcessId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// One row of the OS process table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: ProcessId,

    /// Short command name as reported by the kernel (may be truncated)
    pub name: String,

    /// Basename of the executable from the full command line, if readable
    pub command: Option<String>,
}

impl ProcessEntry {
    pub fn new(pid: impl Into<ProcessId>, name: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            name: name.into(),
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Names this process can be matched by
    pub fn match_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.command.as_deref())
    }
}

/// Host adapter trait - implemented by platform-specific adapters
///
/// Calls are made from the single enforcement thread once per tick, so
/// implementations may block briefly.
pub trait ProcessHost: Send + Sync {
    /// Snapshot the live (non-zombie) processes visible to this user
    fn list_processes(&self) -> HostResult<Vec<ProcessEntry>>;

    /// Send an uncatchable kill signal to a single process
    fn kill(&self, pid: ProcessId) -> HostResult<()>;

    /// Short adapter name for logs
    fn name(&self) -> &'static str {
        "host"
    }
}
