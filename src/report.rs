//! The report record and its assembly from a finished sampling run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{finalize, mean1};
use crate::classify::{classify, top_processes, ProcessAlert, SystemAlert, TopProcess};
use crate::config::SampleConfig;
use crate::host::HostSnapshot;
use crate::sampler::{now_seconds, run_sampling, ExclusionRule, SamplingRun};
use crate::source::ProcessSource;
use crate::trend::TrendResult;

pub const REPORT_VERSION: &str = "1.0";
pub const SAMPLING_METHOD: &str = "avg/peak/sustain";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingInfo {
    pub samples: usize,
    pub interval_sec: f64,
    pub method: String,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub cpu_threshold: Option<f64>,
    #[serde(default)]
    pub mem_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSummary {
    pub cpu_avg: f64,
    pub mem_avg: f64,
    pub stress_score: f64,
    #[serde(default)]
    pub alerts: Vec<SystemAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub time: NaiveDateTime,
    pub report_version: String,
    pub sampling: SamplingInfo,
    #[serde(default)]
    pub host: HostSnapshot,
    pub system: SystemSummary,
    #[serde(default)]
    pub top_processes: Vec<TopProcess>,
    #[serde(default)]
    pub alerts: Vec<ProcessAlert>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendResult>,
}

impl Report {
    /// Returns the report with `trend` attached.
    pub fn with_trend(self, trend: TrendResult) -> Self {
        Self {
            trend: Some(trend),
            ..self
        }
    }
}

/// Finalize, classify and rank a completed run into a report.
pub fn assemble(
    run: &SamplingRun,
    config: &SampleConfig,
    host: HostSnapshot,
    top_n: usize,
    time: NaiveDateTime,
) -> Report {
    let processes = finalize(&run.accumulators);
    let cpu_avg = mean1(&run.system_cpu);
    let mem_avg = mean1(&run.system_mem);
    let classification = classify(&processes, config, cpu_avg, mem_avg);

    Report {
        time,
        report_version: REPORT_VERSION.to_string(),
        sampling: SamplingInfo {
            samples: config.samples,
            interval_sec: config.interval_sec,
            method: SAMPLING_METHOD.to_string(),
            started_at: Some(run.started_at),
            cpu_threshold: Some(config.cpu_threshold),
            mem_threshold: Some(config.mem_threshold),
        },
        host,
        system: SystemSummary {
            cpu_avg,
            mem_avg,
            stress_score: classification.stress_score,
            alerts: classification.system_alerts,
        },
        top_processes: top_processes(&processes, top_n),
        alerts: classification.alerts,
        trend: None,
    }
}

/// Run the full sampling loop against `source` and assemble the report.
pub fn collect_report(
    source: &mut dyn ProcessSource,
    config: &SampleConfig,
    exclusion: &ExclusionRule,
    host: HostSnapshot,
    top_n: usize,
) -> Report {
    let run = run_sampling(source, config, exclusion);
    let report = assemble(&run, config, host, top_n, now_seconds());
    info!(
        "Report assembled: cpu_avg={} mem_avg={} score={} alerts={}",
        report.system.cpu_avg,
        report.system.mem_avg,
        report.system.stress_score,
        report.alerts.len()
    );
    report
}
