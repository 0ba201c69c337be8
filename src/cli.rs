//! CLI arguments and subcommands for stressmon.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use stressmon::config::Config;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "stressmon",
    about = "Per-process CPU/memory stress report with trend tracking",
    long_about = "Per-process CPU/memory stress report with trend tracking.\n\n\
                  Samples every process and the whole system several times, flags \
                  processes whose load is sustained or high on average, scores overall \
                  stress and compares the result with the previous report. Suggestions \
                  are advisory only; no process is ever touched.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Preset profile (dev/meeting/game); explicit flags override it
    #[arg(long, global = true)]
    pub preset: Option<String>,

    /// Per-process CPU threshold (%)
    #[arg(long, global = true)]
    pub cpu_threshold: Option<f64>,

    /// Per-process memory threshold (%)
    #[arg(long, global = true)]
    pub mem_threshold: Option<f64>,

    /// Number of sampling ticks (values below 1 are raised to 1)
    #[arg(short = 'n', long, global = true, allow_negative_numbers = true)]
    pub samples: Option<i64>,

    /// Seconds between ticks (negative values are treated as 0)
    #[arg(short = 'i', long, global = true, allow_negative_numbers = true)]
    pub interval: Option<f64>,

    /// Number of processes in the top list
    #[arg(long, global = true)]
    pub top_n: Option<usize>,

    /// Directory holding report files
    #[arg(short = 'o', long, global = true)]
    pub report_dir: Option<PathBuf>,

    /// Language for console text (en, ja)
    #[arg(long, global = true)]
    pub lang: Option<String>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Do not compare with the previous report
    #[arg(long, global = true)]
    pub no_trend: bool,

    /// Print the top-N table and alert details
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Path to JSON test data file (replays frames instead of reading /proc)
    #[arg(short = 't', long, global = true)]
    pub test_data_file: Option<PathBuf>,
}

impl Args {
    /// Flags given on the command line, as the top config layer.
    pub fn overrides(&self) -> Config {
        Config {
            preset: self.preset.clone(),
            cpu_threshold: self.cpu_threshold,
            mem_threshold: self.mem_threshold,
            samples: self.samples,
            interval: self.interval,
            top_n: self.top_n,
            report_dir: self.report_dir.clone(),
            language: self.lang.clone(),
            log_level: self.log_level.map(|l| format!("{:?}", l).to_lowercase()),
        }
    }
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample, analyze and write a report (default)
    Run,

    /// Compare two existing reports (defaults to the two newest)
    Trend {
        /// Older report file
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Newer report file
        #[arg(long)]
        current: Option<PathBuf>,
    },

    /// Validate configuration and system requirements
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate synthetic test data JSON file
    GenerateTestdata {
        /// Output file path
        #[arg(long, default_value = "testdata.json")]
        output: PathBuf,

        /// Number of frames (ticks) to generate
        #[arg(long, default_value_t = 5)]
        frames: usize,

        /// Number of processes per frame
        #[arg(long, default_value_t = 12)]
        processes: usize,
    },
}
