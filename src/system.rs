//! System-wide metrics collection from /proc filesystem.
//!
//! This module provides functions to read whole-machine CPU and memory
//! utilization and the static host facts (CPU model, core count, kernel
//! release) from the /proc filesystem.

use std::fs;
use std::path::{Path, PathBuf};

/// System memory information in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryInfo {
    /// Percentage of memory in use, `(total - available) / total * 100`.
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        used as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Aggregate CPU time counters from the `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Calculate total CPU time (all fields).
    pub fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle + self.iowait + self.irq + self.softirq + self.steal
    }

    /// Calculate non-active time (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// Location of the /proc tree. Tests point this at a temporary directory.
#[derive(Debug, Clone)]
pub struct ProcRoot {
    root: PathBuf,
}

impl Default for ProcRoot {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    fn read(&self, rel: &str) -> Result<String, String> {
        let path = self.join(rel);
        fs::read_to_string(&path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
    }

    /// Reads total and available memory from /proc/meminfo.
    pub fn read_memory_info(&self) -> Result<MemoryInfo, String> {
        parse_memory_info(&self.read("meminfo")?)
    }

    /// Reads the aggregate CPU counters from /proc/stat.
    pub fn read_cpu_stat(&self) -> Result<CpuStat, String> {
        parse_cpu_stat(&self.read("stat")?)
    }

    /// Gets the number of logical CPU cores by counting "processor" lines.
    pub fn read_cpu_core_count(&self) -> Result<usize, String> {
        let count = parse_cpu_count(&self.read("cpuinfo")?);
        if count == 0 {
            return Err("No processors found in /proc/cpuinfo".to_string());
        }
        Ok(count)
    }

    /// Reads the first "model name" entry from /proc/cpuinfo.
    pub fn read_cpu_model(&self) -> Result<String, String> {
        parse_cpu_model(&self.read("cpuinfo")?)
            .ok_or_else(|| "No model name found in /proc/cpuinfo".to_string())
    }

    /// Reads a single-line kernel value such as `sys/kernel/hostname`.
    pub fn read_kernel_value(&self, rel: &str) -> Result<String, String> {
        let value = self.read(rel)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("{} is empty", rel));
        }
        Ok(value.to_string())
    }
}

fn parse_kb_line(line: &str) -> Option<u64> {
    // Format: "MemTotal:       16384000 kB"
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

pub(crate) fn parse_memory_info(content: &str) -> Result<MemoryInfo, String> {
    let mut total_bytes: Option<u64> = None;
    let mut available_bytes: Option<u64> = None;

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            total_bytes = parse_kb_line(line);
        } else if line.starts_with("MemAvailable:") {
            available_bytes = parse_kb_line(line);
        }

        if total_bytes.is_some() && available_bytes.is_some() {
            break;
        }
    }

    match (total_bytes, available_bytes) {
        (Some(total), Some(available)) => Ok(MemoryInfo {
            total_bytes: total,
            available_bytes: available,
        }),
        _ => Err("Failed to parse MemTotal or MemAvailable from /proc/meminfo".to_string()),
    }
}

pub(crate) fn parse_cpu_stat(content: &str) -> Result<CpuStat, String> {
    let line = content
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| "No aggregate cpu line found in /proc/stat".to_string())?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return Err(format!(
            "Invalid /proc/stat cpu line: expected at least 8 fields, got {}",
            parts.len()
        ));
    }

    let field = |i: usize| parts.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);

    Ok(CpuStat {
        user: field(1),
        nice: field(2),
        system: field(3),
        idle: field(4),
        iowait: field(5),
        irq: field(6),
        softirq: field(7),
        steal: field(8),
    })
}

fn parse_cpu_count(content: &str) -> usize {
    content
        .lines()
        .filter(|line| line.starts_with("processor"))
        .count()
}

fn parse_cpu_model(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.starts_with("model name"))
        .filter_map(|line| line.split_once(':'))
        .map(|(_, v)| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Busy share of CPU time between two counter snapshots, in percent.
pub fn cpu_busy_percent(previous: &CpuStat, current: &CpuStat) -> f64 {
    let delta_total = current.total().saturating_sub(previous.total());
    let delta_idle = current.idle_total().saturating_sub(previous.idle_total());

    if delta_total == 0 {
        return 0.0;
    }
    delta_total.saturating_sub(delta_idle) as f64 / delta_total as f64 * 100.0
}

/// Whole-system CPU reader that keeps the previous /proc/stat snapshot.
///
/// The first call only primes the reader and returns `None`: a percentage
/// is only meaningful as a delta over a measurement interval.
#[derive(Debug, Default)]
pub struct SystemCpuReader {
    previous: Option<CpuStat>,
}

impl SystemCpuReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }

    /// Feed a fresh counter snapshot and get the busy percentage since the last one.
    pub fn update(&mut self, current: CpuStat) -> Option<f64> {
        let percent = self
            .previous
            .as_ref()
            .map(|previous| cpu_busy_percent(previous, &current));
        self.previous = Some(current);
        percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_info() {
        let meminfo = "MemTotal:       16384000 kB\nMemFree:        1000000 kB\nMemAvailable:    4096000 kB\n";
        let mem = parse_memory_info(meminfo).unwrap();
        assert_eq!(mem.total_bytes, 16384000 * 1024);
        assert_eq!(mem.available_bytes, 4096000 * 1024);
        assert!((mem.used_percent() - 75.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_memory_info_missing_fields() {
        let meminfo = "MemFree:        8192000 kB\nSwapFree:        2048000 kB\n";
        assert!(parse_memory_info(meminfo).is_err());
    }

    #[test]
    fn test_used_percent_zero_total() {
        let mem = MemoryInfo {
            total_bytes: 0,
            available_bytes: 0,
        };
        assert_eq!(mem.used_percent(), 0.0);
    }

    #[test]
    fn test_parse_cpu_stat_skips_per_core_lines() {
        let stat = "cpu0 1 1 1 1 1 1 1 1\ncpu  100 0 50 800 50 0 0 0 0 0\nintr 1\n";
        let cpu = parse_cpu_stat(stat).unwrap();
        assert_eq!(cpu.user, 100);
        assert_eq!(cpu.total(), 1000);
        assert_eq!(cpu.idle_total(), 850);
    }

    #[test]
    fn test_parse_cpu_stat_short_line() {
        assert!(parse_cpu_stat("cpu 1 2 3\n").is_err());
        assert!(parse_cpu_stat("intr 1 2 3\n").is_err());
    }

    #[test]
    fn test_system_cpu_reader_primes_first() {
        let mut reader = SystemCpuReader::new();
        let first = CpuStat {
            user: 100,
            nice: 0,
            system: 0,
            idle: 900,
            iowait: 0,
            irq: 0,
            softirq: 0,
            steal: 0,
        };
        assert_eq!(reader.update(first), None);
        assert!(reader.is_primed());

        let second = CpuStat {
            user: 175,
            idle: 925,
            ..first
        };
        let percent = reader.update(second).unwrap();
        assert!((percent - 75.0).abs() < 0.001);
    }

    #[test]
    fn test_cpu_busy_percent_no_progress() {
        let stat = CpuStat {
            user: 1,
            nice: 0,
            system: 0,
            idle: 1,
            iowait: 0,
            irq: 0,
            softirq: 0,
            steal: 0,
        };
        assert_eq!(cpu_busy_percent(&stat, &stat), 0.0);
    }

    #[test]
    fn test_parse_cpu_count_and_model() {
        let cpuinfo = "processor\t: 0\nmodel name\t: Test CPU @ 3.0GHz\nprocessor\t: 1\nmodel name\t: Test CPU @ 3.0GHz\n";
        assert_eq!(parse_cpu_count(cpuinfo), 2);
        assert_eq!(parse_cpu_model(cpuinfo).as_deref(), Some("Test CPU @ 3.0GHz"));
        assert_eq!(parse_cpu_model("processor\t: 0\n"), None);
    }

    #[test]
    fn test_proc_root_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sys/kernel")).unwrap();
        std::fs::write(dir.path().join("sys/kernel/hostname"), "box\n").unwrap();
        std::fs::write(
            dir.path().join("meminfo"),
            "MemTotal: 1000 kB\nMemAvailable: 250 kB\n",
        )
        .unwrap();

        let root = ProcRoot::new(dir.path());
        assert_eq!(root.read_kernel_value("sys/kernel/hostname").unwrap(), "box");
        assert!(root.read_kernel_value("sys/kernel/osrelease").is_err());
        assert!((root.read_memory_info().unwrap().used_percent() - 75.0).abs() < 0.001);
    }
}
