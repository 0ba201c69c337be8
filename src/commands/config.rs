//! Config command implementation.
//!
//! Writes a configuration file with every default spelled out.

use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use stressmon::config::{preset_names, Config};

/// Serializes a config in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Adds comments to YAML configuration
fn add_config_comments(yaml: String) -> String {
    let comments = format!(
        r#"# stressmon Configuration
# ========================
#
# Sampling
# --------
# preset: null                 # One of: {presets}
# cpu_threshold: 50.0          # Per-process CPU threshold (%)
# mem_threshold: 10.0          # Per-process memory threshold (%)
# samples: 3                   # Number of ticks (minimum 1)
# interval: 0.5                # Seconds between ticks (minimum 0)
#
# Report
# ------
# top_n: 5                     # Processes listed in top_processes
# report_dir: "reports"        # Where report_YYYYMMDD-HHMMSS.json files go
# language: "en"               # Console text language: en, ja
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#,
        presets = preset_names().join(", ")
    );

    format!("{comments}\n{yaml}")
}

/// Generates configuration files
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::with_defaults();
    let output = output.unwrap_or_else(|| PathBuf::from("stressmon.yaml"));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Configuration written to: {}", output.display());
    }

    Ok(())
}
