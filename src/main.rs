use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use baseliner::cli::{Cli, Command};
use baseliner::{accumulator::TimingAccumulator, compare, csv_output::ComparisonCsv, events, recap};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for warning/debug output
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Replay an event log through an accumulator, then recap/persist per settings
fn run_record(events_path: &Path, settings: recap::ReportSettings) -> Result<()> {
    let events = events::read_event_log(events_path)?;
    let mut accumulator = TimingAccumulator::new();
    for (index, event) in events.into_iter().enumerate() {
        accumulator
            .observe(event)
            .with_context(|| format!("event {} in {}", index + 1, events_path.display()))?;
    }
    recap::finish_run(&accumulator.snapshot(), &settings)
}

/// Load snapshots and print the comparison table
fn run_compare(files: &[PathBuf], mode: compare::DeltaMode) -> Result<()> {
    let runs = compare::load_runs(files)?;
    let rows = compare::compare(&runs, mode)?;
    let labels = files.iter().map(|path| path.display().to_string()).collect();
    print!("{}", ComparisonCsv::with_rows(labels, rows).to_csv());
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Record {
            events,
            no_recap,
            no_host_timings,
            write_json,
            json_file,
            columns,
        } => {
            let settings = recap::ReportSettings {
                show_host_timings: !no_host_timings,
                display_recap: !no_recap,
                write_json,
                json_file,
                columns,
            };
            run_record(&events, settings)
        }
        Command::Compare { files, duration } => {
            let mode = if duration {
                compare::DeltaMode::Duration
            } else {
                compare::DeltaMode::Lag
            };
            run_compare(&files, mode)
        }
    }
}
