//! Cross-run alignment and per-target delta computation
//!
//! Consumes persisted snapshots from N independent runs of the same nominal
//! playbook. Plays and tasks are matched positionally across runs; targets
//! within a task are paired by their position in execution-start order, not
//! by name, since parallel dispatch makes the same logical target land in
//! different relative order from run to run. Callers needing identity
//! matching must diff by name themselves.

use std::path::PathBuf;

use thiserror::Error;

use crate::snapshot::{HostTiming, RunSnapshot, TaskEntry};

/// Which per-target metric the comparison table reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    /// Queueing delay between task start and the target beginning execution
    #[default]
    Lag,
    /// The target's own execution time
    Duration,
}

/// A run with fewer plays or tasks than the reference cannot be aligned;
/// a partial table would be more misleading than an explicit failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("structural mismatch: run {run} has {found} plays but the reference has {expected}")]
    PlayCount {
        run: usize,
        expected: usize,
        found: usize,
    },

    #[error(
        "structural mismatch: run {run} has {found} tasks in play {play:?} \
         but the reference has {expected}"
    )]
    TaskCount {
        run: usize,
        play: String,
        expected: usize,
        found: usize,
    },
}

/// The j-th task of the i-th play, collected from every run
#[derive(Debug, Clone)]
pub struct AlignedTaskRow<'a> {
    pub play_name: &'a str,
    pub task_name: &'a str,
    pub per_run: Vec<&'a TaskEntry>,
}

/// One output row: an aligned (play, task, target-position) triple with one
/// delta per run; `None` marks a run with no target at that position
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub play: String,
    pub task: String,
    pub host: String,
    pub deltas: Vec<Option<f64>>,
}

/// Load snapshots from one file per run, in run order
pub fn load_runs(paths: &[PathBuf]) -> anyhow::Result<Vec<RunSnapshot>> {
    paths.iter().map(|path| RunSnapshot::load(path)).collect()
}

/// Match plays and tasks positionally across runs, run 0 as the reference
pub fn align(runs: &[RunSnapshot]) -> Result<Vec<AlignedTaskRow<'_>>, CompareError> {
    let Some(reference) = runs.first() else {
        return Ok(Vec::new());
    };

    for (run, snapshot) in runs.iter().enumerate().skip(1) {
        if snapshot.plays.len() < reference.plays.len() {
            return Err(CompareError::PlayCount {
                run,
                expected: reference.plays.len(),
                found: snapshot.plays.len(),
            });
        }
    }

    let mut rows = Vec::new();
    for (i, play) in reference.plays.iter().enumerate() {
        for (run, snapshot) in runs.iter().enumerate().skip(1) {
            if snapshot.plays[i].tasks.len() < play.tasks.len() {
                return Err(CompareError::TaskCount {
                    run,
                    play: play.play.name.clone(),
                    expected: play.tasks.len(),
                    found: snapshot.plays[i].tasks.len(),
                });
            }
        }
        for (j, task) in play.tasks.iter().enumerate() {
            rows.push(AlignedTaskRow {
                play_name: &play.play.name,
                task_name: &task.task.name,
                per_run: runs.iter().map(|run| &run.plays[i].tasks[j]).collect(),
            });
        }
    }
    Ok(rows)
}

/// Hosts of a task in execution order: ascending offset end (the instant the
/// target actually began executing), name as a deterministic tiebreak
fn hosts_in_start_order(task: &TaskEntry) -> Vec<(&str, &HostTiming)> {
    let mut hosts: Vec<(&str, &HostTiming)> = task
        .hosts
        .iter()
        .map(|(name, host)| (name.as_str(), host))
        .collect();
    hosts.sort_by(|a, b| {
        a.1.offset
            .end
            .cmp(&b.1.offset.end)
            .then_with(|| a.0.cmp(b.0))
    });
    hosts
}

fn round2(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// Compute one output row per target position of the reference run
///
/// Runs with fewer targets than the reference at some position contribute an
/// absent cell; runs with more are ignored past the reference's count.
pub fn compute_deltas(row: &AlignedTaskRow<'_>, mode: DeltaMode) -> Vec<ComparisonRow> {
    let per_run_hosts: Vec<Vec<(&str, &HostTiming)>> =
        row.per_run.iter().map(|task| hosts_in_start_order(task)).collect();
    let positions = per_run_hosts.first().map_or(0, Vec::len);

    (0..positions)
        .map(|k| {
            let host = match mode {
                // positional label: identity across runs is not guaranteed
                DeltaMode::Lag => format!("host{}", k + 1),
                // duration mode tracks a position's cost under the name the
                // reference run saw there
                DeltaMode::Duration => per_run_hosts[0][k].0.to_string(),
            };
            let deltas = per_run_hosts
                .iter()
                .map(|hosts| {
                    hosts
                        .get(k)
                        .and_then(|(_, timing)| match mode {
                            DeltaMode::Lag => timing.offset.seconds(),
                            DeltaMode::Duration => timing.duration.seconds(),
                        })
                        .map(round2)
                })
                .collect();
            ComparisonRow {
                play: row.play_name.to_string(),
                task: row.task_name.to_string(),
                host,
                deltas,
            }
        })
        .collect()
}

/// Align N runs and compute every delta row
pub fn compare(runs: &[RunSnapshot], mode: DeltaMode) -> Result<Vec<ComparisonRow>, CompareError> {
    Ok(align(runs)?
        .iter()
        .flat_map(|row| compute_deltas(row, mode))
        .collect())
}
