//! Incremental timing-state accumulator
//!
//! A single-writer state machine fed by the orchestrator's serialized event
//! stream. It does as little work per event as possible to limit observer
//! effect: raw instants are stored and every derived metric (elapsed seconds,
//! lag) is computed later at report time.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::warn;

use crate::events::RunEvent;
use crate::snapshot::{
    HostTiming, Interval, PlayEntry, RunSnapshot, TargetStatus, TaskEntry, Timestamp, UnitTiming,
};

/// Errors for events that arrive before their parent has started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorError {
    #[error("task {task:?} started before any play")]
    NoCurrentPlay { task: String },

    #[error("target event for {host:?} arrived before any task started")]
    NoCurrentTask { host: String },
}

pub type Result<T> = std::result::Result<T, AccumulatorError>;

/// Builds the nested timing record for one run
///
/// One instance per run; the "current" play and task are always the last
/// appended ones. Callers must serialize event delivery — the accumulator has
/// no internal locking.
#[derive(Debug, Default)]
pub struct TimingAccumulator {
    plays: Vec<PlayEntry>,
    /// Execution-start instants for the current task, keyed by target name
    host_start: HashMap<String, Timestamp>,
}

impl TimingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new play and make it current
    pub fn on_play_start(&mut self, name: &str, id: &str, now: Timestamp) {
        self.plays.push(PlayEntry {
            play: UnitTiming {
                name: name.to_string(),
                id: id.to_string(),
                duration: Interval::open(now),
            },
            tasks: Vec::new(),
        });
    }

    /// Append a new task to the current play and make it current; the
    /// per-target start table resets with every task
    pub fn on_task_start(&mut self, name: &str, id: &str, now: Timestamp) -> Result<()> {
        let play = self.plays.last_mut().ok_or_else(|| {
            AccumulatorError::NoCurrentPlay {
                task: name.to_string(),
            }
        })?;
        self.host_start.clear();
        play.tasks.push(TaskEntry {
            task: UnitTiming {
                name: name.to_string(),
                id: id.to_string(),
                duration: Interval::open(now),
            },
            hosts: BTreeMap::new(),
        });
        Ok(())
    }

    /// Record the instant a target began executing within the current task.
    /// A later start for the same target overwrites the pending entry.
    pub fn on_target_start(&mut self, host: &str, now: Timestamp) {
        self.host_start.insert(host.to_string(), now);
    }

    /// Finalize a target's timing; success, failure, unreachable and skip all
    /// finalize identically. A completion for a target never seen starting
    /// falls back to the task's start instant and records a warning.
    pub fn on_target_complete(
        &mut self,
        host: &str,
        now: Timestamp,
        status: TargetStatus,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        let no_task = || AccumulatorError::NoCurrentTask {
            host: host.to_string(),
        };
        let play = self.plays.last_mut().ok_or_else(no_task)?;
        let task = play.tasks.last_mut().ok_or_else(no_task)?;

        let task_start = task.task.duration.start;
        let started = match self.host_start.get(host) {
            Some(&started) => started,
            None => {
                warn!(host, "completion for a target never seen starting; using task start");
                task_start
            }
        };

        task.hosts.insert(
            host.to_string(),
            HostTiming {
                duration: Interval::closed(started, now),
                offset: Interval::closed(task_start, started),
                status,
                metadata,
            },
        );
        task.task.duration.end = Some(now);
        play.play.duration.end = Some(now);
        Ok(())
    }

    /// Dispatch one event from the stream
    pub fn observe(&mut self, event: RunEvent) -> Result<()> {
        match event {
            RunEvent::PlayStart { name, id, at } => {
                self.on_play_start(&name, &id, at);
                Ok(())
            }
            RunEvent::TaskStart { name, id, at } => self.on_task_start(&name, &id, at),
            RunEvent::TargetStart { host, at } => {
                self.on_target_start(&host, at);
                Ok(())
            }
            RunEvent::TargetComplete {
                host,
                at,
                status,
                metadata,
            } => self.on_target_complete(&host, at, status, metadata),
        }
    }

    /// Immutable copy of the record built so far; callable mid-run
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            plays: self.plays.clone(),
        }
    }
}
