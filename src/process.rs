//! Per-process readers for the /proc filesystem.
//!
//! Every reader here works on a single `/proc/<pid>` directory and returns
//! `std::io::Error` on failure, so callers can tell a vanished process
//! (`NotFound`) or a protected one (`PermissionDenied`) from other problems.

use ahash::AHashMap as HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::system::ProcRoot;

/// Fallback when sysconf cannot report the kernel clock tick rate.
const DEFAULT_CLOCK_TICKS: f64 = 100.0;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Fields pulled from /proc/<pid>/status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStatus {
    /// Real uid, first column of the `Uid:` line.
    pub uid: Option<u32>,
    /// Resident set size; kernel threads report none and read as 0.
    pub rss_bytes: u64,
}

/// Scans the /proc directory for process entries with numeric PIDs.
pub fn collect_proc_entries(root: &ProcRoot) -> Vec<ProcEntry> {
    let mut out = Vec::new();
    let entries = match fs::read_dir(root.path()) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Failed to list {}: {}", root.path().display(), e);
            return out;
        }
    };

    for entry in entries.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        out.push(ProcEntry { pid, proc_path: p });
    }

    out.sort_by_key(|e| e.pid);
    out
}

/// Reads process name from comm file or extracts it from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    if let Ok(s) = fs::read_to_string(proc_path.join("comm")) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let content = fs::read(proc_path.join("cmdline")).ok()?;
    let first = content.split(|&b| b == 0u8).next()?;
    let first = std::str::from_utf8(first).ok()?;
    Path::new(first)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
}

/// Kernel clock ticks per second, used to convert /proc/<pid>/stat jiffies.
pub fn clock_ticks_per_second() -> f64 {
    // SAFETY: sysconf has no preconditions and only reads a constant.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as f64
    } else {
        DEFAULT_CLOCK_TICKS
    }
}

/// Parse total CPU time (user+system) in seconds from /proc/<pid>/stat.
pub fn read_cpu_time_seconds(proc_path: &Path, ticks_per_second: f64) -> io::Result<f64> {
    let content = fs::read_to_string(proc_path.join("stat"))?;
    parse_cpu_time_seconds(&content, ticks_per_second)
}

/// The comm field may contain spaces and parentheses, so fields are counted
/// from the last closing parenthesis. `utime` and `stime` are fields 14 and 15.
pub(crate) fn parse_cpu_time_seconds(content: &str, ticks_per_second: f64) -> io::Result<f64> {
    let rest = content
        .rfind(')')
        .map(|i| &content[i + 1..])
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid stat format"))?;

    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() < 13 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "Invalid stat format"));
    }

    let utime: f64 = parts[11].parse().unwrap_or(0.0);
    let stime: f64 = parts[12].parse().unwrap_or(0.0);
    Ok((utime + stime) / ticks_per_second)
}

/// Reads owner uid and resident memory from /proc/<pid>/status.
pub fn read_status(proc_path: &Path) -> io::Result<ProcStatus> {
    let content = fs::read_to_string(proc_path.join("status"))?;
    Ok(parse_status(&content))
}

pub(crate) fn parse_status(content: &str) -> ProcStatus {
    let mut status = ProcStatus::default();
    for line in content.lines() {
        if let Some(v) = line.strip_prefix("Uid:") {
            status.uid = v.split_whitespace().next().and_then(|s| s.parse().ok());
        } else if let Some(v) = line.strip_prefix("VmRSS:") {
            status.rss_bytes = parse_kb_value(v).unwrap_or(0) * 1024;
        }
    }
    status
}

/// Parses kilobyte values such as " 1234 kB".
fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// uid → login name table built from /etc/passwd.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    names: HashMap<u32, String>,
}

impl UserTable {
    /// Loads /etc/passwd; an unreadable file yields an empty table.
    pub fn load() -> Self {
        Self::load_from(Path::new("/etc/passwd"))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                debug!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        let mut names = HashMap::new();
        for line in content.lines() {
            if line.starts_with('#') {
                continue;
            }
            let mut fields = line.split(':');
            let (Some(name), Some(_), Some(uid)) = (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if let Ok(uid) = uid.parse::<u32>() {
                names.entry(uid).or_insert_with(|| name.to_string());
            }
        }
        Self { names }
    }

    /// Login name for `uid`, or the numeric id when it has no entry.
    pub fn name_of(&self, uid: u32) -> String {
        self.names
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }
}
