//! Run command implementation.
//!
//! Samples the system, assembles the report, attaches the trend against the
//! previous report and writes the result.

use anyhow::Context;
use std::path::PathBuf;
use tracing::{debug, info};

use stressmon::config::Config;
use stressmon::host::HostSnapshot;
use stressmon::render::{render_details, render_summary};
use stressmon::report::collect_report;
use stressmon::sampler::ExclusionRule;
use stressmon::source::{load_test_data_from_file, ProcFsSource, ProcessSource, ReplaySource};
use stressmon::store::ReportStore;
use stressmon::system::ProcRoot;

/// Options for a single report run beyond the resolved config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub test_data_file: Option<PathBuf>,
    pub no_trend: bool,
    pub verbose: bool,
}

pub fn command_run(config: &Config, options: &RunOptions) -> anyhow::Result<()> {
    let sample_config = config.sample_config();
    let lang = config.language();
    let store = ReportStore::new(config.report_dir());

    let mut source: Box<dyn ProcessSource> = match &options.test_data_file {
        Some(path) => {
            let data = load_test_data_from_file(path)
                .map_err(anyhow::Error::msg)
                .context("Cannot use test data")?;
            info!("Replaying {} test frames from {}", data.frames.len(), path.display());
            Box::new(ReplaySource::from(data))
        }
        None => Box::new(ProcFsSource::new()),
    };

    let host = HostSnapshot::read(&ProcRoot::default());
    debug!("Host: {:?}", host);

    let mut report = collect_report(
        source.as_mut(),
        &sample_config,
        &ExclusionRule::for_current_process(),
        host,
        config.top_n(),
    );

    if !options.no_trend {
        if let Some(trend) = store.trend_for(&report) {
            info!("Trend vs {}: {:?}", trend.previous_report, trend.summary);
            report = report.with_trend(trend);
        }
    }

    let path = store.save(&report)?;

    print!("{}", render_summary(&report, Some(&path), lang));
    if options.verbose {
        print!("{}", render_details(&report, lang));
    }

    Ok(())
}
