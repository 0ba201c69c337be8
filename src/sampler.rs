//! The repeated-sampling loop and per-process accumulation.
//!
//! The loop owns the accumulator map for the whole run and hands it to
//! [`crate::aggregate::finalize`] once every tick has completed.

use ahash::AHashMap as HashMap;
use chrono::{Local, NaiveDateTime, Timelike};
use std::io;
use std::thread;
use tracing::{debug, info, warn};

use crate::config::SampleConfig;
use crate::source::{ProcessIdentity, ProcessReading, ProcessSource};

/// Running totals for one process across ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessAccumulator {
    pub pid: u32,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub cpu_sum: f64,
    pub mem_sum: f64,
    pub cpu_peak: f64,
    pub mem_peak: f64,
    /// Ticks in which this process was actually read.
    pub samples: u32,
    pub cpu_over: u32,
    pub mem_over: u32,
}

impl ProcessAccumulator {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            name: None,
            owner: None,
            cpu_sum: 0.0,
            mem_sum: 0.0,
            cpu_peak: 0.0,
            mem_peak: 0.0,
            samples: 0,
            cpu_over: 0,
            mem_over: 0,
        }
    }

    /// Fold one reading in. Identity fields keep the last-seen value.
    pub fn record(&mut self, name: Option<String>, reading: ProcessReading, config: &SampleConfig) {
        self.name = name;
        self.owner = reading.owner;
        self.samples += 1;
        self.cpu_sum += reading.cpu_percent;
        self.mem_sum += reading.mem_percent;
        self.cpu_peak = self.cpu_peak.max(reading.cpu_percent);
        self.mem_peak = self.mem_peak.max(reading.mem_percent);

        if reading.cpu_percent > config.cpu_threshold {
            self.cpu_over += 1;
        }
        if reading.mem_percent > config.mem_threshold {
            self.mem_over += 1;
        }
    }
}

/// Per-process accumulators keyed by pid.
pub type Accumulators = HashMap<u32, ProcessAccumulator>;

/// Which processes never enter the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionRule {
    pub self_pid: u32,
    /// Skip the idle-time pseudo-process (pid 0, "System Idle Process") on
    /// platforms that account idle time as a process.
    pub idle_accounting: bool,
}

impl ExclusionRule {
    /// Excludes the calling process; idle exclusion follows the platform.
    pub fn for_current_process() -> Self {
        Self {
            self_pid: std::process::id(),
            idle_accounting: cfg!(windows),
        }
    }

    pub fn excludes(&self, process: &ProcessIdentity) -> bool {
        if process.pid == self.self_pid {
            return true;
        }
        if !self.idle_accounting {
            return false;
        }
        if process.pid == 0 {
            return true;
        }
        process
            .name
            .as_deref()
            .map(|n| n.trim().to_lowercase())
            .is_some_and(|n| n.contains("idle") && n.contains("process"))
    }
}

/// Read every live process once and fold the readings into `accumulators`.
///
/// A process that cannot be read is skipped for this tick only; its
/// existing accumulator is left untouched.
pub fn sample_tick(
    accumulators: &mut Accumulators,
    source: &mut dyn ProcessSource,
    config: &SampleConfig,
    exclusion: &ExclusionRule,
) {
    let mut read = 0usize;
    let mut skipped = 0usize;

    for process in source.processes() {
        if exclusion.excludes(&process) {
            continue;
        }

        let reading = match source.read_process(&process) {
            Ok(reading) => reading,
            Err(e) => {
                match e.kind() {
                    io::ErrorKind::NotFound => {
                        debug!("Skipping process {}: exited during scan", process.pid)
                    }
                    io::ErrorKind::PermissionDenied => {
                        debug!("Skipping process {}: permission denied", process.pid)
                    }
                    _ => debug!("Skipping process {}: {}", process.pid, e),
                }
                skipped += 1;
                continue;
            }
        };

        accumulators
            .entry(process.pid)
            .or_insert_with(|| ProcessAccumulator::new(process.pid))
            .record(process.name, reading, config);
        read += 1;
    }

    debug!("Tick finished: {} processes read, {} skipped", read, skipped);
}

/// Everything the sampling loop produced.
#[derive(Debug, Clone)]
pub struct SamplingRun {
    pub started_at: NaiveDateTime,
    pub accumulators: Accumulators,
    pub system_cpu: Vec<f64>,
    pub system_mem: Vec<f64>,
}

/// Ticks worth of storage reserved up front; longer runs grow on demand.
const PRESIZED_TICKS: usize = 1024;

fn tick_series(samples: usize) -> Vec<f64> {
    Vec::with_capacity(samples.min(PRESIZED_TICKS))
}

/// Local wall-clock time truncated to whole seconds.
pub fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Prime the source, then run `config.samples` ticks with `config.interval`
/// between them (no delay before the first).
pub fn run_sampling(
    source: &mut dyn ProcessSource,
    config: &SampleConfig,
    exclusion: &ExclusionRule,
) -> SamplingRun {
    source.prime();

    let started_at = now_seconds();
    let mut accumulators = Accumulators::new();
    let mut system_cpu = tick_series(config.samples);
    let mut system_mem = tick_series(config.samples);

    info!(
        "Sampling {} ticks at {:.2}s interval (cpu > {}%, mem > {}%)",
        config.samples, config.interval_sec, config.cpu_threshold, config.mem_threshold
    );

    for tick in 0..config.samples {
        if tick > 0 && config.interval_sec > 0.0 {
            thread::sleep(config.interval());
        }

        source.begin_tick();
        match source.read_system() {
            Ok(system) => {
                system_cpu.push(system.cpu_percent);
                system_mem.push(system.mem_percent);
            }
            Err(e) => warn!("System reading failed on tick {}: {}", tick + 1, e),
        }
        sample_tick(&mut accumulators, source, config, exclusion);
    }

    info!(
        "Sampling finished: {} processes observed over {} ticks",
        accumulators.len(),
        config.samples
    );

    SamplingRun {
        started_at,
        accumulators,
        system_cpu,
        system_mem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ReplaySource, SystemReading, TestFrame, TestProcess};

    fn proc(pid: u32, name: &str, cpu: f64, mem: f64) -> TestProcess {
        TestProcess {
            pid,
            name: Some(name.into()),
            user: Some("alice".into()),
            cpu_percent: cpu,
            mem_percent: mem,
            unreadable: false,
        }
    }

    fn frame(processes: Vec<TestProcess>) -> TestFrame {
        TestFrame {
            system: SystemReading {
                cpu_percent: 30.0,
                mem_percent: 50.0,
            },
            processes,
        }
    }

    fn no_exclusion() -> ExclusionRule {
        ExclusionRule {
            self_pid: u32::MAX,
            idle_accounting: false,
        }
    }

    fn config() -> SampleConfig {
        SampleConfig::new(50.0, 10.0, 5, 0.0)
    }

    #[test]
    fn test_sustained_readings_accumulate() {
        let frames = [80.0, 80.0, 80.0, 10.0, 10.0]
            .iter()
            .map(|&cpu| frame(vec![proc(1, "spin", cpu, 1.0)]))
            .collect();
        let mut source = ReplaySource::new(frames);

        let run = run_sampling(&mut source, &config(), &no_exclusion());
        let acc = &run.accumulators[&1];
        assert_eq!(acc.samples, 5);
        assert_eq!(acc.cpu_over, 3);
        assert_eq!(acc.mem_over, 0);
        assert!((acc.cpu_sum - 260.0).abs() < 1e-9);
        assert_eq!(acc.cpu_peak, 80.0);
        assert_eq!(run.system_cpu.len(), 5);
        assert_eq!(run.system_mem, vec![50.0; 5]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut source = ReplaySource::new(vec![frame(vec![proc(1, "edge", 50.0, 10.0)])]);
        let run = run_sampling(&mut source, &SampleConfig::new(50.0, 10.0, 3, 0.0), &no_exclusion());
        let acc = &run.accumulators[&1];
        assert_eq!(acc.samples, 3);
        assert_eq!(acc.cpu_over, 0);
        assert_eq!(acc.mem_over, 0);
    }

    #[test]
    fn test_transient_failure_keeps_history() {
        let mut hidden = proc(1, "flaky", 90.0, 1.0);
        hidden.unreadable = true;
        let frames = vec![
            frame(vec![proc(1, "flaky", 90.0, 1.0), proc(2, "other", 1.0, 1.0)]),
            frame(vec![hidden, proc(2, "other", 1.0, 1.0)]),
            frame(vec![proc(2, "other", 1.0, 1.0)]),
            frame(vec![proc(1, "flaky-renamed", 70.0, 2.0)]),
        ];
        let mut source = ReplaySource::new(frames);
        let run = run_sampling(&mut source, &SampleConfig::new(50.0, 10.0, 4, 0.0), &no_exclusion());

        let flaky = &run.accumulators[&1];
        assert_eq!(flaky.samples, 2);
        assert_eq!(flaky.cpu_over, 2);
        assert_eq!(flaky.name.as_deref(), Some("flaky-renamed"));
        assert_eq!(run.accumulators[&2].samples, 3);
    }

    #[test]
    fn test_over_counts_never_exceed_samples() {
        let frames = (0..6)
            .map(|i| frame(vec![proc(1, "a", 40.0 + 10.0 * i as f64, 5.0 * i as f64)]))
            .collect();
        let mut source = ReplaySource::new(frames);
        let run = run_sampling(&mut source, &SampleConfig::new(50.0, 10.0, 8, 0.0), &no_exclusion());
        for acc in run.accumulators.values() {
            assert!(acc.cpu_over <= acc.samples);
            assert!(acc.mem_over <= acc.samples);
        }
    }

    #[test]
    fn test_self_is_excluded() {
        let rule = ExclusionRule {
            self_pid: 7,
            idle_accounting: false,
        };
        let mut source = ReplaySource::new(vec![frame(vec![
            proc(7, "stressmon", 99.0, 5.0),
            proc(0, "System Idle Process", 99.0, 0.0),
        ])]);
        let run = run_sampling(&mut source, &SampleConfig::new(50.0, 10.0, 2, 0.0), &rule);
        assert!(!run.accumulators.contains_key(&7));
        // Without idle accounting, pid 0 is an ordinary process.
        assert!(run.accumulators.contains_key(&0));
    }

    #[test]
    fn test_idle_accounting_exclusion() {
        let rule = ExclusionRule {
            self_pid: 7,
            idle_accounting: true,
        };
        let idle = |pid, name: Option<&str>| ProcessIdentity {
            pid,
            name: name.map(String::from),
        };
        assert!(rule.excludes(&idle(0, None)));
        assert!(rule.excludes(&idle(4, Some(" System IDLE Process "))));
        assert!(!rule.excludes(&idle(4, Some("idle"))));
        assert!(!rule.excludes(&idle(5, None)));
    }

    #[test]
    fn test_empty_process_list() {
        let mut source = ReplaySource::new(vec![frame(vec![])]);
        let run = run_sampling(&mut source, &config(), &no_exclusion());
        assert!(run.accumulators.is_empty());
        assert_eq!(run.system_cpu.len(), 5);
    }

    #[test]
    fn test_tick_series_presize_is_bounded() {
        let huge = SampleConfig::new(50.0, 10.0, i64::MAX, 0.0);
        let series = tick_series(huge.samples);
        assert!(series.capacity() >= PRESIZED_TICKS);
        assert!(series.capacity() < huge.samples);
        assert!(tick_series(3).capacity() >= 3);
    }
}
