//! Per-process CPU time cache.
//!
//! Process CPU percentage is the delta of cumulative CPU seconds over wall
//! time between two reads of the same pid. This module keeps the last
//! reading per pid so consecutive ticks can compute that delta.

use ahash::AHashMap as HashMap;
use std::time::Instant;

/// Cumulative CPU seconds of one process at a point in time.
#[derive(Debug, Clone, Copy)]
pub struct CpuEntry {
    pub cpu_time_seconds: f64,
    pub last_updated: Instant,
}

#[derive(Debug, Default)]
pub struct CpuTimeCache {
    entries: HashMap<u32, CpuEntry>,
}

impl CpuTimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.contains_key(&pid)
    }

    /// Record a reading for `pid` and return the CPU percentage since the
    /// previous one. The first reading of a pid only primes the cache and
    /// returns `None`.
    pub fn update(&mut self, pid: u32, cpu_time_seconds: f64, now: Instant) -> Option<f64> {
        let previous = self.entries.insert(
            pid,
            CpuEntry {
                cpu_time_seconds,
                last_updated: now,
            },
        )?;

        let dt = now.duration_since(previous.last_updated).as_secs_f64();
        if dt <= 0.0 {
            return Some(0.0);
        }
        // A shrinking counter means the pid was recycled; treat as idle.
        let delta_cpu = (cpu_time_seconds - previous.cpu_time_seconds).max(0.0);
        Some(delta_cpu / dt * 100.0)
    }

    /// Drop a pid, e.g. after it vanished mid-read.
    pub fn forget(&mut self, pid: u32) {
        self.entries.remove(&pid);
    }
}
