//! stressmon: samples per-process and system-wide CPU and memory load,
//! flags stressed processes against configurable thresholds and compares
//! each report with the previous one.
//!
//! The pipeline is [`sampler::run_sampling`] → [`aggregate::finalize`] →
//! [`classify::classify`] → [`report::assemble`], with [`trend::compare`]
//! attached when an earlier report exists. Nothing here ever acts on a
//! process; suggestions are advisory text.

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod config;
pub mod host;
pub mod process;
pub mod render;
pub mod report;
pub mod sampler;
pub mod source;
pub mod store;
pub mod system;
pub mod text;
pub mod trend;
