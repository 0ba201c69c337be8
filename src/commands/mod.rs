//! CLI command implementations for stressmon.
//!
//! This module provides implementations for all CLI subcommands:
//! - `run`: Sample, analyze and persist a report
//! - `trend`: Compare two stored reports
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `generate-testdata`: Test data generation

pub mod check;
pub mod config;
pub mod generate;
pub mod run;
pub mod trend;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use run::command_run;
pub use trend::command_trend;
