//! End-of-run recap rendering and snapshot persistence

use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::Result;

use crate::snapshot::{RunSnapshot, TaskEntry};

/// Knobs controlling what happens when a run finishes
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Add per-host timings to each task in the recap
    pub show_host_timings: bool,
    /// Print the recap at all; off when the JSON output is processed
    /// automatically
    pub display_recap: bool,
    /// Persist the snapshot to `json_file`
    pub write_json: bool,
    pub json_file: PathBuf,
    /// Width the stat lines are padded to
    pub columns: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            show_host_timings: true,
            display_recap: true,
            write_json: false,
            json_file: PathBuf::from("/tmp/baseline.json"),
            columns: 80,
        }
    }
}

/// One recap line: left and right text joined by a run of fill characters
fn stat_line(left: &str, right: &str, fill: char, columns: usize) -> String {
    let used = left.chars().count() + right.chars().count() + 2;
    let pad: String = std::iter::repeat(fill)
        .take(columns.saturating_sub(used))
        .collect();
    format!("{left} {pad} {right}")
}

/// Hosts of a task sorted by ascending wait (queueing lag), name as tiebreak
fn hosts_by_wait(task: &TaskEntry) -> Vec<(&str, f64, f64)> {
    let mut hosts: Vec<(&str, f64, f64)> = task
        .hosts
        .iter()
        .map(|(name, host)| {
            (
                name.as_str(),
                host.offset.seconds().unwrap_or(0.0),
                host.duration.seconds().unwrap_or(0.0),
            )
        })
        .collect();
    hosts.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    hosts
}

/// Render the recap text for a run
///
/// A play with no end instant terminates the recap: the run was interrupted
/// or task-filtered, which is an expected partial state.
pub fn render_recap(snapshot: &RunSnapshot, settings: &ReportSettings) -> String {
    let mut out = String::new();
    for play in &snapshot.plays {
        let Some(play_secs) = play.play.duration.seconds() else {
            break;
        };
        out.push_str(&stat_line(
            &format!("Play: {}", play.play.name),
            &format!("{play_secs:.2}s"),
            '*',
            settings.columns,
        ));
        out.push('\n');

        for task in &play.tasks {
            let Some(task_secs) = task.task.duration.seconds() else {
                continue;
            };
            out.push_str(&stat_line(
                &format!("    {}", task.task.name),
                &format!("{task_secs:.2}s"),
                '-',
                settings.columns,
            ));
            out.push('\n');

            if settings.show_host_timings {
                for (name, wait, duration) in hosts_by_wait(task) {
                    out.push_str(&stat_line(
                        &format!("        {name}"),
                        &format!("{duration:.2}s / {wait:.2}s"),
                        '.',
                        settings.columns,
                    ));
                    out.push('\n');
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Persist and/or print the finished run according to the settings
pub fn finish_run(snapshot: &RunSnapshot, settings: &ReportSettings) -> Result<()> {
    if settings.write_json {
        snapshot.save(&settings.json_file)?;
    }
    if settings.display_recap {
        print!("{}", render_recap(snapshot, settings));
    }
    Ok(())
}
