//! Where per-tick readings come from.
//!
//! The sampling loop only talks to a [`ProcessSource`]. [`ProcFsSource`]
//! reads the live system through /proc; [`ReplaySource`] plays back frames
//! from a JSON test data file so the whole pipeline can run without a live
//! system.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::cache::CpuTimeCache;
use crate::process::{
    clock_ticks_per_second, collect_proc_entries, read_cpu_time_seconds, read_process_name,
    read_status, UserTable,
};
use crate::system::{ProcRoot, SystemCpuReader};

/// A process as seen while enumerating, before any per-process read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: Option<String>,
}

/// Instantaneous per-process utilization, relative to total system capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReading {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub owner: Option<String>,
}

/// Instantaneous whole-system utilization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemReading {
    pub cpu_percent: f64,
    pub mem_percent: f64,
}

pub trait ProcessSource {
    /// Throwaway read of every CPU counter so the first real tick measures
    /// an interval instead of lifetime usage.
    fn prime(&mut self);

    /// Called once at the start of every tick.
    fn begin_tick(&mut self) {}

    fn read_system(&mut self) -> Result<SystemReading, String>;

    /// Enumerate live processes for this tick.
    fn processes(&mut self) -> Vec<ProcessIdentity>;

    /// Read one process. `NotFound` means it exited since enumeration,
    /// `PermissionDenied` that it is not ours to inspect.
    fn read_process(&mut self, process: &ProcessIdentity) -> io::Result<ProcessReading>;
}

/// Live source backed by the /proc filesystem.
pub struct ProcFsSource {
    root: ProcRoot,
    cpu_cache: CpuTimeCache,
    system_cpu: SystemCpuReader,
    users: UserTable,
    ticks_per_second: f64,
    mem_total_bytes: u64,
}

impl ProcFsSource {
    pub fn new() -> Self {
        Self::with_root(ProcRoot::default(), UserTable::load())
    }

    pub fn with_root(root: ProcRoot, users: UserTable) -> Self {
        Self {
            root,
            cpu_cache: CpuTimeCache::new(),
            system_cpu: SystemCpuReader::new(),
            users,
            ticks_per_second: clock_ticks_per_second(),
            mem_total_bytes: 0,
        }
    }

    fn mem_total_bytes(&mut self) -> u64 {
        if self.mem_total_bytes == 0 {
            match self.root.read_memory_info() {
                Ok(info) => self.mem_total_bytes = info.total_bytes,
                Err(e) => debug!("Memory total unavailable: {}", e),
            }
        }
        self.mem_total_bytes
    }
}

impl Default for ProcFsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for ProcFsSource {
    fn prime(&mut self) {
        match self.root.read_cpu_stat() {
            Ok(stat) => {
                self.system_cpu.update(stat);
            }
            Err(e) => debug!("Failed to prime system CPU reader: {}", e),
        }

        let now = Instant::now();
        let entries = collect_proc_entries(&self.root);
        for entry in &entries {
            if let Ok(secs) = read_cpu_time_seconds(&entry.proc_path, self.ticks_per_second) {
                self.cpu_cache.update(entry.pid, secs, now);
            }
        }
        debug!(
            "Primed CPU readers for {} of {} processes",
            self.cpu_cache.len(),
            entries.len()
        );
    }

    fn read_system(&mut self) -> Result<SystemReading, String> {
        let stat = self.root.read_cpu_stat()?;
        // Unprimed reads measure nothing; report idle rather than lifetime load.
        let cpu_percent = self.system_cpu.update(stat).unwrap_or(0.0);
        let mem_percent = self.root.read_memory_info()?.used_percent();
        Ok(SystemReading {
            cpu_percent,
            mem_percent,
        })
    }

    fn processes(&mut self) -> Vec<ProcessIdentity> {
        collect_proc_entries(&self.root)
            .into_iter()
            .map(|entry| ProcessIdentity {
                pid: entry.pid,
                name: read_process_name(&entry.proc_path),
            })
            .collect()
    }

    fn read_process(&mut self, process: &ProcessIdentity) -> io::Result<ProcessReading> {
        let proc_path = self.root.join(process.pid.to_string());

        let secs = match read_cpu_time_seconds(&proc_path, self.ticks_per_second) {
            Ok(secs) => secs,
            Err(e) => {
                // Only an exited pid loses its primed counter.
                if e.kind() == io::ErrorKind::NotFound {
                    self.cpu_cache.forget(process.pid);
                }
                return Err(e);
            }
        };
        // A process born after priming gets 0.0 on its first reading.
        let cpu_percent = self
            .cpu_cache
            .update(process.pid, secs, Instant::now())
            .unwrap_or(0.0);

        let status = read_status(&proc_path)?;
        let mem_total = self.mem_total_bytes();
        let mem_percent = if mem_total > 0 {
            status.rss_bytes as f64 / mem_total as f64 * 100.0
        } else {
            0.0
        };

        Ok(ProcessReading {
            cpu_percent,
            mem_percent,
            owner: status.uid.map(|uid| self.users.name_of(uid)),
        })
    }
}

/// Test process entry for JSON serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestProcess {
    pub pid: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    /// Simulates a permission error for this process in this frame.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unreadable: bool,
}

/// Everything observed during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFrame {
    pub system: SystemReading,
    #[serde(default)]
    pub processes: Vec<TestProcess>,
}

/// Root structure for test data JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestData {
    pub version: String,
    pub generated_at: String,
    pub frames: Vec<TestFrame>,
}

/// Load test data from JSON file.
pub fn load_test_data_from_file(path: &Path) -> Result<TestData, String> {
    debug!("Loading test data from: {}", path.display());

    if !path.exists() {
        return Err(format!("Test data file not found: {}", path.display()));
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read test data file: {}", e))?;
    let test_data: TestData = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse test data JSON: {}", e))?;

    if test_data.frames.is_empty() {
        return Err(format!("Test data file has no frames: {}", path.display()));
    }

    info!(
        "Loaded test data version {} from {} ({} frames)",
        test_data.version,
        test_data.generated_at,
        test_data.frames.len()
    );

    Ok(test_data)
}

/// Replays recorded frames, one per tick. Once the frames run out the last
/// one is repeated.
pub struct ReplaySource {
    frames: Vec<TestFrame>,
    cursor: Option<usize>,
}

impl ReplaySource {
    pub fn new(frames: Vec<TestFrame>) -> Self {
        Self {
            frames,
            cursor: None,
        }
    }

    fn frame(&self) -> Option<&TestFrame> {
        self.frames.get(self.cursor?)
    }
}

impl From<TestData> for ReplaySource {
    fn from(data: TestData) -> Self {
        Self::new(data.frames)
    }
}

impl ProcessSource for ReplaySource {
    fn prime(&mut self) {}

    fn begin_tick(&mut self) {
        let last = self.frames.len().saturating_sub(1);
        self.cursor = Some(match self.cursor {
            None => 0,
            Some(i) => (i + 1).min(last),
        });
    }

    fn read_system(&mut self) -> Result<SystemReading, String> {
        self.frame()
            .map(|f| f.system)
            .ok_or_else(|| "No test frame available".to_string())
    }

    fn processes(&mut self) -> Vec<ProcessIdentity> {
        self.frame()
            .map(|f| {
                f.processes
                    .iter()
                    .map(|p| ProcessIdentity {
                        pid: p.pid,
                        name: p.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read_process(&mut self, process: &ProcessIdentity) -> io::Result<ProcessReading> {
        let found = self
            .frame()
            .and_then(|f| f.processes.iter().find(|p| p.pid == process.pid))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "process exited"))?;

        if found.unreadable {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }

        Ok(ProcessReading {
            cpu_percent: found.cpu_percent,
            mem_percent: found.mem_percent,
            owner: found.user.clone(),
        })
    }
}
