//! Alert classification, stress scoring and top-N ranking.
//!
//! Every function here is pure: it reads finalized processes and produces
//! new values. Reasons and suggestions are plain categories; the display
//! text lives in [`crate::text`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::aggregate::{round1, FinalizedProcess};
use crate::config::SampleConfig;

/// Share of ticks over threshold at which a breach counts as sustained.
pub const SUSTAIN_RATIO: f64 = 0.6;
/// System-wide alert levels. Fixed, unlike the per-process thresholds.
pub const SYSTEM_CPU_THRESHOLD: f64 = 70.0;
pub const SYSTEM_MEM_THRESHOLD: f64 = 80.0;
/// Below this average memory share a sustained CPU hog gets the
/// investigate suggestion.
pub const LOW_MEM_PERCENT: f64 = 5.0;

const CPU_WEIGHT: f64 = 0.7;
const MEM_WEIGHT: f64 = 0.3;
const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    SustainedCpu,
    MomentaryCpu,
    SustainedMem,
    MomentaryMem,
}

/// Advisory only; nothing ever acts on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    InvestigateCpu,
    RestartOrReconfigure,
    KeepMonitoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemAlert {
    HighCpu,
    HighMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessAlert {
    pub pid: u32,
    pub name: Option<String>,
    pub user: Option<String>,
    pub cpu_avg: f64,
    pub mem_avg: f64,
    pub cpu_peak: f64,
    pub mem_peak: f64,
    pub sustain_count: u32,
    pub samples: u32,
    pub reasons: Vec<Reason>,
    pub suggestion: Suggestion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProcess {
    pub pid: u32,
    pub name: Option<String>,
    pub user: Option<String>,
    pub cpu_avg: f64,
    pub cpu_peak: f64,
    pub mem_avg: f64,
    pub mem_peak: f64,
    pub samples: u32,
}

impl From<&FinalizedProcess> for TopProcess {
    fn from(p: &FinalizedProcess) -> Self {
        Self {
            pid: p.pid,
            name: p.name.clone(),
            user: p.user.clone(),
            cpu_avg: p.cpu_avg,
            cpu_peak: p.cpu_peak,
            mem_avg: p.mem_avg,
            mem_peak: p.mem_peak,
            samples: p.samples,
        }
    }
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub alerts: Vec<ProcessAlert>,
    pub system_alerts: Vec<SystemAlert>,
    pub stress_score: f64,
}

/// Descending order on (cpu_avg, mem_avg, cpu_peak, mem_peak).
fn rank(a: [f64; 4], b: [f64; 4]) -> Ordering {
    b.iter()
        .zip(a.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn sustained(over: u32, samples: u32) -> bool {
    samples > 0 && f64::from(over) / f64::from(samples) >= SUSTAIN_RATIO
}

/// One axis: a sustained breach wins over, and suppresses, a momentary one.
fn axis_reason(
    over: u32,
    samples: u32,
    avg: f64,
    threshold: f64,
    sustained_reason: Reason,
    momentary_reason: Reason,
) -> Option<Reason> {
    if sustained(over, samples) {
        Some(sustained_reason)
    } else if avg > threshold {
        Some(momentary_reason)
    } else {
        None
    }
}

pub fn suggest(reasons: &[Reason], mem_avg: f64) -> Suggestion {
    if reasons.contains(&Reason::SustainedCpu) && mem_avg < LOW_MEM_PERCENT {
        Suggestion::InvestigateCpu
    } else if reasons.contains(&Reason::SustainedMem) {
        Suggestion::RestartOrReconfigure
    } else {
        Suggestion::KeepMonitoring
    }
}

/// Alert for one process, or `None` when no rule trips.
pub fn classify_process(p: &FinalizedProcess, config: &SampleConfig) -> Option<ProcessAlert> {
    let reasons: Vec<Reason> = [
        axis_reason(
            p.cpu_over,
            p.samples,
            p.cpu_avg,
            config.cpu_threshold,
            Reason::SustainedCpu,
            Reason::MomentaryCpu,
        ),
        axis_reason(
            p.mem_over,
            p.samples,
            p.mem_avg,
            config.mem_threshold,
            Reason::SustainedMem,
            Reason::MomentaryMem,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if reasons.is_empty() {
        return None;
    }

    Some(ProcessAlert {
        pid: p.pid,
        name: p.name.clone(),
        user: p.user.clone(),
        cpu_avg: p.cpu_avg,
        mem_avg: p.mem_avg,
        cpu_peak: p.cpu_peak,
        mem_peak: p.mem_peak,
        sustain_count: p.cpu_over.max(p.mem_over),
        samples: p.samples,
        suggestion: suggest(&reasons, p.mem_avg),
        reasons,
    })
}

/// Ranked alerts for every process that trips at least one rule.
pub fn classify_processes(processes: &[FinalizedProcess], config: &SampleConfig) -> Vec<ProcessAlert> {
    let mut alerts: Vec<ProcessAlert> = processes
        .iter()
        .filter_map(|p| classify_process(p, config))
        .collect();
    alerts.sort_by(|a, b| {
        rank(
            [a.cpu_avg, a.mem_avg, a.cpu_peak, a.mem_peak],
            [b.cpu_avg, b.mem_avg, b.cpu_peak, b.mem_peak],
        )
    });
    alerts
}

pub fn system_alerts(cpu_avg: f64, mem_avg: f64) -> Vec<SystemAlert> {
    let mut alerts = Vec::new();
    if cpu_avg >= SYSTEM_CPU_THRESHOLD {
        alerts.push(SystemAlert::HighCpu);
    }
    if mem_avg >= SYSTEM_MEM_THRESHOLD {
        alerts.push(SystemAlert::HighMemory);
    }
    alerts
}

/// Composite 0-100 severity, CPU weighted 70% and memory 30%.
pub fn stress_score(cpu_avg: f64, mem_avg: f64) -> f64 {
    round1((cpu_avg * CPU_WEIGHT + mem_avg * MEM_WEIGHT).min(MAX_SCORE))
}

/// The `limit` heaviest processes regardless of alert status. `limit` is
/// raised to 1 when 0.
pub fn top_processes(processes: &[FinalizedProcess], limit: usize) -> Vec<TopProcess> {
    let mut ranked: Vec<&FinalizedProcess> = processes.iter().collect();
    ranked.sort_by(|a, b| {
        rank(
            [a.cpu_avg, a.mem_avg, a.cpu_peak, a.mem_peak],
            [b.cpu_avg, b.mem_avg, b.cpu_peak, b.mem_peak],
        )
    });
    ranked
        .into_iter()
        .take(limit.max(1))
        .map(TopProcess::from)
        .collect()
}

/// Per-process alerts plus system-level flags and score.
pub fn classify(
    processes: &[FinalizedProcess],
    config: &SampleConfig,
    system_cpu_avg: f64,
    system_mem_avg: f64,
) -> Classification {
    Classification {
        alerts: classify_processes(processes, config),
        system_alerts: system_alerts(system_cpu_avg, system_mem_avg),
        stress_score: stress_score(system_cpu_avg, system_mem_avg),
    }
}
