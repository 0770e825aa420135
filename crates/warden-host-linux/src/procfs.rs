//! Process table snapshots from /proc

use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;
use warden_host_api::{HostError, HostResult, ProcessEntry};
use warden_util::ProcessId;

/// Default procfs mount point
pub const PROC_ROOT: &str = "/proc";

/// Reads process entries from a procfs tree
#[derive(Debug, Clone)]
pub struct ProcfsReader {
    root: PathBuf,
}

impl ProcfsReader {
    pub fn new() -> Self {
        Self::with_root(PROC_ROOT)
    }

    /// Read from an alternate procfs root (used by tests)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the root looks like a mounted procfs
    pub fn is_available(&self) -> bool {
        self.root.join("self").exists() || self.root.join("1").exists()
    }

    /// Snapshot every live process.
    ///
    /// Processes that vanish mid-scan are skipped, as are zombies.
    pub fn snapshot(&self) -> HostResult<Vec<ProcessEntry>> {
        let dir = fs::read_dir(&self.root).map_err(|e| {
            HostError::EnumerationFailed(format!("{}: {}", self.root.display(), e))
        })?;

        let mut entries = Vec::new();
        for dirent in dir.flatten() {
            let Some(pid) = dirent
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };

            if let Some(entry) = self.read_process(ProcessId::new(pid)) {
                entries.push(entry);
            }
        }

        entries.sort_by_key(|e| e.pid);
        Ok(entries)
    }

    fn read_process(&self, pid: ProcessId) -> Option<ProcessEntry> {
        let dir = self.root.join(pid.to_string());

        let stat = fs::read_to_string(dir.join("stat")).ok()?;
        let (stat_name, state) = parse_stat(&stat)?;
        if matches!(state, 'Z' | 'X') {
            trace!(%pid, %state, "Skipping dead process");
            return None;
        }

        let name = fs::read_to_string(dir.join("comm"))
            .map(|s| s.trim_end_matches('\n').to_string())
            .unwrap_or(stat_name);

        let mut entry = ProcessEntry::new(pid, name);
        if let Some(exe) = fs::read(dir.join("cmdline"))
            .ok()
            .and_then(|raw| argv0_basename(&raw))
        {
            entry = entry.with_command(exe);
        }

        Some(entry)
    }
}

impl Default for ProcfsReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the command name and state from `/proc/<pid>/stat`.
///
/// The name sits in parentheses and may itself contain spaces or `)`,
/// so the state is read after the last `)`.
pub fn parse_stat(stat: &str) -> Option<(String, char)> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    if close < open {
        return None;
    }

    let name = stat[open + 1..close].to_string();
    let state = stat.get(close + 1..)?.trim_start().chars().next()?;
    Some((name, state))
}

/// Basename of the first NUL-separated argument in `/proc/<pid>/cmdline`
pub fn argv0_basename(cmdline: &[u8]) -> Option<String> {
    let argv0 = cmdline.split(|b| *b == 0).next()?;
    if argv0.is_empty() {
        return None;
    }

    let argv0 = String::from_utf8_lossy(argv0);
    // Programs that rewrite their title leave one space-joined string
    let program = if cmdline.contains(&0) {
        &*argv0
    } else {
        argv0.split(' ').next().unwrap_or(&argv0)
    };
    let base = Path::new(program).file_name()?.to_string_lossy().into_owned();

    (!base.is_empty()).then_some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_process(root: &Path, pid: u32, comm: &str, state: char, cmdline: &[u8]) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("stat"),
            format!("{} ({}) {} 1 {} {} 0 -1", pid, comm, state, pid, pid),
        )
        .unwrap();
        fs::write(dir.join("comm"), format!("{}\n", comm)).unwrap();
        fs::write(dir.join("cmdline"), cmdline).unwrap();
    }

    #[test]
    fn parse_stat_with_awkward_name() {
        let (name, state) = parse_stat("42 (Web Content (x)) S 1 42 42 0").unwrap();
        assert_eq!(name, "Web Content (x)");
        assert_eq!(state, 'S');

        assert!(parse_stat("garbage").is_none());
    }

    #[test]
    fn argv0_basename_variants() {
        assert_eq!(
            argv0_basename(b"/usr/lib/firefox/firefox\0-contentproc\0"),
            Some("firefox".into())
        );
        assert_eq!(argv0_basename(b"discord --type=renderer"), Some("discord".into()));
        assert_eq!(argv0_basename(b""), None);
        assert_eq!(argv0_basename(b"\0"), None);
    }

    #[test]
    fn snapshot_reads_fake_proc_tree() {
        let root = tempfile::tempdir().unwrap();
        fake_process(root.path(), 10, "Web Content", 'S', b"/usr/lib/firefox/firefox\0");
        fake_process(root.path(), 20, "bash", 'R', b"bash\0");
        fake_process(root.path(), 30, "defunct", 'Z', b"");
        fake_process(root.path(), 40, "kworker/0:1", 'I', b"");
        fs::create_dir_all(root.path().join("sys")).unwrap();

        let reader = ProcfsReader::with_root(root.path());
        let entries = reader.snapshot().unwrap();

        let pids: Vec<u32> = entries.iter().map(|e| e.pid.as_u32()).collect();
        assert_eq!(pids, vec![10, 20, 40]);
        assert_eq!(entries[0].name, "Web Content");
        assert_eq!(entries[0].command.as_deref(), Some("firefox"));
        assert_eq!(entries[2].command, None);
    }

    #[test]
    fn vanished_process_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fake_process(root.path(), 10, "bash", 'S', b"bash\0");
        // Directory without a stat file, as when a process exits mid-scan
        fs::create_dir_all(root.path().join("11")).unwrap();

        let entries = ProcfsReader::with_root(root.path()).snapshot().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_root_is_enumeration_failure() {
        let root = tempfile::tempdir().unwrap();
        let reader = ProcfsReader::with_root(root.path().join("absent"));

        assert!(!reader.is_available());
        assert!(matches!(
            reader.snapshot(),
            Err(HostError::EnumerationFailed(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_snapshot_contains_self() {
        let reader = ProcfsReader::new();
        let me = std::process::id();

        let entries = reader.snapshot().unwrap();
        assert!(entries.iter().any(|e| e.pid.as_u32() == me));
    }
}
