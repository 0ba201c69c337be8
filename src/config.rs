//! Configuration loading, presets and the immutable per-run sampling config.
//!
//! Values are resolved with the precedence CLI flag > config file > preset >
//! built-in default. Out-of-range sample counts and intervals are clamped,
//! never rejected.

use ahash::AHashMap as HashMap;
use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::text::Lang;

// Default configuration constants
pub const DEFAULT_CPU_THRESHOLD: f64 = 50.0;
pub const DEFAULT_MEM_THRESHOLD: f64 = 10.0;
pub const DEFAULT_SAMPLES: i64 = 3;
pub const DEFAULT_INTERVAL_SEC: f64 = 0.5;
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_REPORT_DIR: &str = "reports";

const DEFAULT_CONFIG_LOCATIONS: &[&str] = &[
    "/etc/stressmon/stressmon.yaml",
    "./stressmon.yaml",
    "./stressmon.yml",
    "./stressmon.json",
    "./stressmon.toml",
];

/// Threshold and sampling values bundled under a name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub cpu_threshold: f64,
    pub mem_threshold: f64,
    pub samples: i64,
    pub interval: f64,
}

pub static PRESETS: Lazy<HashMap<&'static str, Preset>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(
        "dev",
        Preset {
            cpu_threshold: 45.0,
            mem_threshold: 12.0,
            samples: 4,
            interval: 0.5,
        },
    );
    map.insert(
        "meeting",
        Preset {
            cpu_threshold: 35.0,
            mem_threshold: 12.0,
            samples: 5,
            interval: 0.7,
        },
    );
    map.insert(
        "game",
        Preset {
            cpu_threshold: 70.0,
            mem_threshold: 15.0,
            samples: 3,
            interval: 0.5,
        },
    );
    map
});

/// Sorted preset names, for help output and validation messages.
pub fn preset_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PRESETS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Thresholds and timing for one report run. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub cpu_threshold: f64,
    pub mem_threshold: f64,
    pub samples: usize,
    pub interval_sec: f64,
}

impl SampleConfig {
    /// Builds a config, clamping `samples` to at least 1 and `interval_sec`
    /// to at least 0.
    pub fn new(cpu_threshold: f64, mem_threshold: f64, samples: i64, interval_sec: f64) -> Self {
        let interval_sec = if interval_sec.is_finite() {
            interval_sec.max(0.0)
        } else {
            0.0
        };
        Self {
            cpu_threshold,
            mem_threshold,
            samples: usize::try_from(samples.max(1)).unwrap_or(1),
            interval_sec,
        }
    }

    /// Delay between ticks; intervals too large for a `Duration` saturate.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_sec).unwrap_or(Duration::MAX)
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_CPU_THRESHOLD,
            DEFAULT_MEM_THRESHOLD,
            DEFAULT_SAMPLES,
            DEFAULT_INTERVAL_SEC,
        )
    }
}

/// Configuration as read from a file or assembled from CLI flags. Every
/// field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Sampling
    pub preset: Option<String>,
    #[serde(alias = "cpu-threshold")]
    pub cpu_threshold: Option<f64>,
    #[serde(alias = "mem-threshold")]
    pub mem_threshold: Option<f64>,
    pub samples: Option<i64>,
    pub interval: Option<f64>,

    // Report
    #[serde(alias = "top-n")]
    pub top_n: Option<usize>,
    #[serde(alias = "report-dir")]
    pub report_dir: Option<PathBuf>,
    pub language: Option<String>,

    // Logging
    pub log_level: Option<String>,
}

impl Config {
    /// Config with every built-in default spelled out, for `config` output.
    pub fn with_defaults() -> Self {
        Self {
            preset: None,
            cpu_threshold: Some(DEFAULT_CPU_THRESHOLD),
            mem_threshold: Some(DEFAULT_MEM_THRESHOLD),
            samples: Some(DEFAULT_SAMPLES),
            interval: Some(DEFAULT_INTERVAL_SEC),
            top_n: Some(DEFAULT_TOP_N),
            report_dir: Some(PathBuf::from(DEFAULT_REPORT_DIR)),
            language: Some(Lang::En.code().to_string()),
            log_level: Some("info".into()),
        }
    }

    /// Layer `self` over `lower`: fields set here win.
    pub fn over(self, lower: Config) -> Config {
        Config {
            preset: self.preset.or(lower.preset),
            cpu_threshold: self.cpu_threshold.or(lower.cpu_threshold),
            mem_threshold: self.mem_threshold.or(lower.mem_threshold),
            samples: self.samples.or(lower.samples),
            interval: self.interval.or(lower.interval),
            top_n: self.top_n.or(lower.top_n),
            report_dir: self.report_dir.or(lower.report_dir),
            language: self.language.or(lower.language),
            log_level: self.log_level.or(lower.log_level),
        }
    }

    fn preset_values(&self) -> Option<Preset> {
        self.preset
            .as_deref()
            .and_then(|name| PRESETS.get(name).copied())
    }

    /// Resolve the sampling config: explicit values, then preset, then defaults.
    pub fn sample_config(&self) -> SampleConfig {
        let preset = self.preset_values();
        SampleConfig::new(
            self.cpu_threshold
                .or(preset.map(|p| p.cpu_threshold))
                .unwrap_or(DEFAULT_CPU_THRESHOLD),
            self.mem_threshold
                .or(preset.map(|p| p.mem_threshold))
                .unwrap_or(DEFAULT_MEM_THRESHOLD),
            self.samples
                .or(preset.map(|p| p.samples))
                .unwrap_or(DEFAULT_SAMPLES),
            self.interval
                .or(preset.map(|p| p.interval))
                .unwrap_or(DEFAULT_INTERVAL_SEC),
        )
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N).max(1)
    }

    pub fn report_dir(&self) -> PathBuf {
        self.report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR))
    }

    pub fn language(&self) -> Lang {
        self.language
            .as_deref()
            .and_then(|code| code.parse().ok())
            .unwrap_or_default()
    }
}

/// Validate effective config (used by --check-config and before a run).
pub fn validate_effective_config(cfg: &Config) -> Result<(), String> {
    if let Some(name) = cfg.preset.as_deref() {
        if !PRESETS.contains_key(name) {
            return Err(format!(
                "Unknown preset '{}', expected one of: {}",
                name,
                preset_names().join(", ")
            ));
        }
    }

    for (field, value) in [
        ("cpu_threshold", cfg.cpu_threshold),
        ("mem_threshold", cfg.mem_threshold),
        ("interval", cfg.interval),
    ] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(format!("{} must be a finite number, got {}", field, v));
            }
        }
    }

    if let Some(code) = cfg.language.as_deref() {
        code.parse::<Lang>()?;
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => return Err(format!("Invalid log_level '{}'", other)),
        }
    }

    Ok(())
}

/// Loads a config file in YAML, JSON or TOML (by extension). Without an
/// explicit path the default locations are tried; finding none yields an
/// empty config.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_values_do_not_panic() {
        let huge = SampleConfig::new(50.0, 10.0, i64::MAX, 1e20);
        assert_eq!(huge.samples, usize::try_from(i64::MAX).unwrap_or(1));
        assert_eq!(huge.interval(), Duration::MAX);

        let cfg = Config {
            interval: Some(1e20),
            samples: Some(i64::MAX),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_ok());
        assert_eq!(cfg.sample_config().interval(), Duration::MAX);
    }

    #[test]
    fn test_sample_config_clamps() {
        let cfg = SampleConfig::new(50.0, 10.0, 0, -2.0);
        assert_eq!(cfg.samples, 1);
        assert_eq!(cfg.interval_sec, 0.0);
        assert_eq!(cfg.interval(), Duration::ZERO);

        let cfg = SampleConfig::new(50.0, 10.0, -7, f64::NAN);
        assert_eq!(cfg.samples, 1);
        assert_eq!(cfg.interval(), Duration::ZERO);

        let cfg = SampleConfig::new(50.0, 10.0, 4, 0.25);
        assert_eq!(cfg.samples, 4);
        assert_eq!(cfg.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_default_sample_config() {
        let cfg = Config::default().sample_config();
        assert_eq!(cfg, SampleConfig::new(50.0, 10.0, 3, 0.5));
    }

    #[test]
    fn test_precedence_cli_file_preset_default() {
        let file = Config {
            preset: Some("meeting".into()),
            cpu_threshold: Some(60.0),
            ..Config::default()
        };
        let cli = Config {
            samples: Some(9),
            ..Config::default()
        };
        let merged = cli.over(file);
        let sample = merged.sample_config();

        assert_eq!(sample.cpu_threshold, 60.0); // file beats preset
        assert_eq!(sample.mem_threshold, 12.0); // preset beats default
        assert_eq!(sample.samples, 9); // cli beats everything
        assert!((sample.interval_sec - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_top_n_minimum() {
        let cfg = Config {
            top_n: Some(0),
            ..Config::default()
        };
        assert_eq!(cfg.top_n(), 1);
        assert_eq!(Config::default().top_n(), 5);
    }

    #[test]
    fn test_validate() {
        assert!(validate_effective_config(&Config::with_defaults()).is_ok());

        let bad_preset = Config {
            preset: Some("party".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&bad_preset).is_err());

        let bad_threshold = Config {
            cpu_threshold: Some(f64::INFINITY),
            ..Config::default()
        };
        assert!(validate_effective_config(&bad_threshold).is_err());

        let bad_lang = Config {
            language: Some("xx".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&bad_lang).is_err());

        let bad_level = Config {
            log_level: Some("loud".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&bad_level).is_err());
    }

    #[test]
    fn test_load_config_formats() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("c.yaml");
        fs::write(&yaml, "preset: game\ntop-n: 3\n").unwrap();
        let cfg = load_config(Some(&yaml)).unwrap();
        assert_eq!(cfg.preset.as_deref(), Some("game"));
        assert_eq!(cfg.top_n(), 3);

        let json = dir.path().join("c.json");
        fs::write(&json, r#"{"cpu_threshold": 80.0, "samples": 2}"#).unwrap();
        let cfg = load_config(Some(&json)).unwrap();
        assert_eq!(cfg.sample_config().cpu_threshold, 80.0);

        let toml_path = dir.path().join("c.toml");
        fs::write(&toml_path, "interval = 1.5\nlanguage = \"ja\"\n").unwrap();
        let cfg = load_config(Some(&toml_path)).unwrap();
        assert_eq!(cfg.interval, Some(1.5));
        assert_eq!(cfg.language(), Lang::Ja);

        assert!(load_config(Some(&dir.path().join("missing.yaml"))).is_err());
    }

    #[test]
    fn test_preset_names_sorted() {
        assert_eq!(preset_names(), vec!["dev", "game", "meeting"]);
    }
}
