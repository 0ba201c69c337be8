//! Trend command implementation.
//!
//! Compares two stored reports without sampling anything.

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

use stressmon::config::Config;
use stressmon::render::render_trend;
use stressmon::store::{load_report, ReportStore};
use stressmon::trend::compare;

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Picks the two newest stored reports when paths are not given.
fn resolve_pair(
    store: &ReportStore,
    previous: Option<PathBuf>,
    current: Option<PathBuf>,
) -> anyhow::Result<(PathBuf, PathBuf)> {
    if let (Some(previous), Some(current)) = (&previous, &current) {
        return Ok((previous.clone(), current.clone()));
    }

    let stored = store.list()?;
    let current = match current {
        Some(path) => path,
        None => match stored.last() {
            Some(r) => r.path.clone(),
            None => bail!("No reports found in {}", store.dir().display()),
        },
    };
    let previous = match previous {
        Some(path) => path,
        None => {
            let current_report = load_report(&current)?;
            match store.previous_before(current_report.time)? {
                Some(r) => r.path,
                None => bail!("No report older than {}", current.display()),
            }
        }
    };
    Ok((previous, current))
}

pub fn command_trend(
    config: &Config,
    previous: Option<PathBuf>,
    current: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = ReportStore::new(config.report_dir());
    let (previous_path, current_path) = resolve_pair(&store, previous, current)?;

    let previous = load_report(&previous_path)
        .with_context(|| format!("Previous report unusable: {}", previous_path.display()))?;
    let current = load_report(&current_path)
        .with_context(|| format!("Current report unusable: {}", current_path.display()))?;

    let trend = compare(&previous, &current, &file_name(&previous_path));
    println!("{} -> {}", file_name(&previous_path), file_name(&current_path));
    println!("{}", render_trend(&trend, config.language()));
    Ok(())
}
