//! stressmon command-line entry point.
//!
//! Resolves configuration (CLI > config file > preset > built-in defaults),
//! installs logging and dispatches to the requested subcommand. Without a
//! subcommand a single report run is performed.

use anyhow::Context;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};

use stressmon::config::{load_config, validate_effective_config, Config};

mod cli;
mod commands;

use cli::{Args, Commands};
use commands::config::render_config;
use commands::run::RunOptions;

/// Merges CLI flags over the config file, unless file loading is disabled.
fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let file = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };
    Ok(args.overrides().over(file))
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let level: LevelFilter = config
        .log_level
        .as_deref()
        .unwrap_or("info")
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid log level: {}", e))?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    debug!("Logging initialized with level: {}", level);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    if args.check_config {
        if let Err(e) = validate_effective_config(&config) {
            eprintln!("[ERROR] Configuration invalid: {}", e);
            std::process::exit(1);
        }
        println!("[OK] Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        println!("{}", render_config(&config, args.config_format)?);
        return Ok(());
    }

    match &args.command {
        Some(Commands::Config {
            output,
            format,
            commented,
        }) => return commands::command_config(output.clone(), *format, *commented),
        Some(Commands::GenerateTestdata {
            output,
            frames,
            processes,
        }) => return commands::command_generate_testdata(output.clone(), *frames, *processes),
        _ => {}
    }

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("[ERROR] Configuration invalid: {}", e);
        std::process::exit(1);
    }

    setup_logging(&config)?;

    match args.command {
        Some(Commands::Check) => {
            if !commands::command_check(&config)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Trend { previous, current }) => {
            commands::command_trend(&config, previous, current)
        }
        Some(Commands::Run) | None => {
            info!("Starting stressmon {}", env!("CARGO_PKG_VERSION"));
            let options = RunOptions {
                test_data_file: args.test_data_file.clone(),
                no_trend: args.no_trend,
                verbose: args.verbose,
            };
            commands::command_run(&config, &options)
        }
        Some(Commands::Config { .. }) | Some(Commands::GenerateTestdata { .. }) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stressmon.yaml");
        std::fs::write(&path, "preset: game\nsamples: 9\ntop_n: 2\n").unwrap();

        let args = Args::parse_from([
            "stressmon",
            "-c",
            path.to_str().unwrap(),
            "--samples",
            "4",
        ]);
        let config = resolve_config(&args).unwrap();
        let sample = config.sample_config();
        assert_eq!(sample.samples, 4);
        assert_eq!(sample.cpu_threshold, 70.0);
        assert_eq!(config.top_n(), 2);
    }

    #[test]
    fn test_no_config_ignores_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stressmon.yaml");
        std::fs::write(&path, "samples: 9\n").unwrap();

        let args = Args::parse_from(["stressmon", "--no-config", "-c", path.to_str().unwrap()]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.sample_config().samples, 3);
    }
}
