//! Baseliner - playbook timing baseline recorder and cross-run comparator
//!
//! This library accumulates per-play/task/host wall-clock timing from an
//! orchestrator's lifecycle event stream, renders an end-of-run recap,
//! persists the nested timing record as JSON, and compares snapshots from
//! independent runs of the same playbook as a per-target delta table.

pub mod accumulator;
pub mod cli;
pub mod compare;
pub mod csv_output;
pub mod events;
pub mod recap;
pub mod snapshot;
