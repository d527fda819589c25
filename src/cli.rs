//! CLI argument parsing for Baseliner

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "baseliner")]
#[command(version)]
#[command(about = "Playbook timing baseline recorder and cross-run comparator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a recorded event log into a timing recap and snapshot
    Record {
        /// Path to a JSON-lines event log
        events: PathBuf,

        /// Do not print the recap (useful when the JSON output is processed
        /// automatically)
        #[arg(long = "no-recap")]
        no_recap: bool,

        /// Omit per-host timings from the recap
        #[arg(long = "no-host-timings")]
        no_host_timings: bool,

        /// Write the timing snapshot to a JSON file
        #[arg(short = 'j', long = "write-json")]
        write_json: bool,

        /// Path for the JSON snapshot
        #[arg(
            long = "json-file",
            value_name = "PATH",
            default_value = "/tmp/baseline.json"
        )]
        json_file: PathBuf,

        /// Recap line width in columns
        #[arg(long = "columns", value_name = "N", default_value = "80")]
        columns: usize,
    },

    /// Compare timing snapshots from multiple runs as a CSV table
    Compare {
        /// Snapshot files, one per run; file order is column order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Calculate host duration, instead of queued time
        #[arg(short = 'd', long = "duration")]
        duration: bool,
    },
}
