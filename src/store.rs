//! Report files on disk.
//!
//! Reports are written as `report_YYYYMMDD-HHMMSS.json`. Ordering is taken
//! from the timestamp parsed out of the name, not from a string sort, and
//! names that do not parse are ignored.

use anyhow::Context;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::report::Report;
use crate::trend::{compare, most_recent_before, TrendResult};

const FILE_PREFIX: &str = "report_";
const FILE_SUFFIX: &str = ".json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// A report file identified by the timestamp in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub timestamp: NaiveDateTime,
    pub path: PathBuf,
}

impl StoredReport {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn report_file_name(timestamp: NaiveDateTime) -> String {
    format!("{}{}{}", FILE_PREFIX, timestamp.format(TIMESTAMP_FORMAT), FILE_SUFFIX)
}

pub fn parse_report_file_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Read and parse one report file.
pub fn load_report(path: &Path) -> anyhow::Result<Report> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report {}", path.display()))
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All stored reports, oldest first. A missing directory is empty.
    pub fn list(&self) -> anyhow::Result<Vec<StoredReport>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to list {}", self.dir.display()))
            }
        };

        let mut reports: Vec<StoredReport> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let timestamp = parse_report_file_name(name.to_str()?)?;
                Some(StoredReport {
                    timestamp,
                    path: entry.path(),
                })
            })
            .collect();
        reports.sort_by_key(|r| r.timestamp);
        Ok(reports)
    }

    /// Most recent report strictly older than `current`.
    pub fn previous_before(&self, current: NaiveDateTime) -> anyhow::Result<Option<StoredReport>> {
        let candidates = self.list()?.into_iter().map(|r| (r.timestamp, r));
        Ok(most_recent_before(candidates, current).map(|(_, r)| r))
    }

    /// Trend against the previous report, if one exists and parses. A bad
    /// previous report is logged and skipped.
    pub fn trend_for(&self, current: &Report) -> Option<TrendResult> {
        let previous = match self.previous_before(current.time) {
            Ok(Some(previous)) => previous,
            Ok(None) => {
                debug!("No earlier report in {}, skipping trend", self.dir.display());
                return None;
            }
            Err(e) => {
                warn!("Could not look up previous report: {:#}", e);
                return None;
            }
        };

        match load_report(&previous.path) {
            Ok(report) => {
                debug!("Comparing against {}", previous.path.display());
                Some(compare(&report, current, &previous.file_name()))
            }
            Err(e) => {
                warn!("Skipping trend: {:#}", e);
                None
            }
        }
    }

    /// Write `report` under a name derived from its timestamp, creating the
    /// directory when needed. The file is written to a temporary name first
    /// and renamed into place.
    pub fn save(&self, report: &Report) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.dir.join(report_file_name(report.time));
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move report into {}", path.display()))?;

        info!("Report written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{sample_report, ts};
    use crate::trend::TrendSummary;

    fn report_at(time: &str, score: f64, alerts: usize) -> Report {
        Report {
            time: ts(time),
            ..sample_report(score, alerts)
        }
    }

    #[test]
    fn test_file_name_round_trip() {
        let t = ts("2024-01-02 03:04:05");
        let name = report_file_name(t);
        assert_eq!(name, "report_20240102-030405.json");
        assert_eq!(parse_report_file_name(&name), Some(t));
        assert_eq!(parse_report_file_name("report_latest.json"), None);
        assert_eq!(parse_report_file_name("notes.txt"), None);
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));
        assert!(store.list().unwrap().is_empty());

        store.save(&report_at("2024-01-02 00:00:00", 1.0, 0)).unwrap();
        store.save(&report_at("2024-01-01 00:00:00", 1.0, 0)).unwrap();
        fs::write(store.dir().join("report_bogus.json"), "{}").unwrap();
        fs::write(store.dir().join("readme.txt"), "hi").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].file_name(), "report_20240101-000000.json");
        assert!(!store.dir().join("report_20240101-000000.json.tmp").exists());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let report = report_at("2024-03-01 08:30:00", 12.5, 2);
        let path = store.save(&report).unwrap();
        assert_eq!(load_report(&path).unwrap(), report);
    }

    #[test]
    fn test_previous_is_strictly_older() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        store.save(&report_at("2024-01-01 00:00:00", 1.0, 0)).unwrap();
        store.save(&report_at("2024-01-03 00:00:00", 1.0, 0)).unwrap();
        store.save(&report_at("2024-01-05 00:00:00", 1.0, 0)).unwrap();

        let prev = store.previous_before(ts("2024-01-05 00:00:00")).unwrap().unwrap();
        assert_eq!(prev.timestamp, ts("2024-01-03 00:00:00"));
        assert!(store.previous_before(ts("2024-01-01 00:00:00")).unwrap().is_none());
    }

    #[test]
    fn test_trend_for() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let current = report_at("2024-01-02 00:00:00", 39.8, 2);
        assert!(store.trend_for(&current).is_none());

        store.save(&report_at("2024-01-01 00:00:00", 40.0, 2)).unwrap();
        let trend = store.trend_for(&current).unwrap();
        assert_eq!(trend.summary, TrendSummary::Improved);
        assert_eq!(trend.previous_report, "report_20240101-000000.json");
    }

    #[test]
    fn test_malformed_previous_skips_trend() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        fs::write(dir.path().join("report_20240101-000000.json"), "{not json").unwrap();
        let current = report_at("2024-01-02 00:00:00", 10.0, 0);
        assert!(store.trend_for(&current).is_none());
    }
}
