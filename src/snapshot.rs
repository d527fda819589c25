//! Nested timing record for one playbook run
//!
//! The wire format matches the baseline JSON files: a run serializes as an
//! array of plays, each play as `{"play": {...}, "tasks": [...]}`, each task
//! as `{"task": {...}, "hosts": {...}}`. Timestamps are naive UTC ISO-8601
//! text with microsecond precision.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Naive UTC instant, microsecond precision on the wire
pub type Timestamp = NaiveDateTime;

/// Serde adapter for `Timestamp` fields (`2018-01-01T12:00:00.000000`)
pub mod iso8601 {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Emitted format: fixed six fractional digits
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    /// Accepted format: fractional digits optional
    pub const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, PARSE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Timestamp>` fields
pub mod iso8601_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ts {
            Some(ts) => super::iso8601::serialize(ts, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| {
                NaiveDateTime::parse_from_str(&text, super::iso8601::PARSE_FORMAT)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}

/// Wall-clock span; `end` is absent while the operation is in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(with = "iso8601")]
    pub start: Timestamp,
    #[serde(default, with = "iso8601_opt", skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
}

impl Interval {
    /// Span with a start but no end yet
    pub fn open(start: Timestamp) -> Self {
        Self { start, end: None }
    }

    pub fn closed(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Elapsed seconds, `None` while the span is still open
    pub fn seconds(&self) -> Option<f64> {
        self.end.map(|end| {
            let delta = end - self.start;
            delta
                .num_microseconds()
                .map(|us| us as f64 / 1_000_000.0)
                .unwrap_or_else(|| delta.num_seconds() as f64)
        })
    }
}

/// Outcome of a target's execution; all variants finalize timing identically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    #[default]
    Ok,
    Failed,
    Unreachable,
    Skipped,
}

impl TargetStatus {
    pub fn is_ok(&self) -> bool {
        *self == Self::Ok
    }
}

/// Timing for one (task, target) pair
///
/// `duration` is the target's own execution span; `offset` runs from task
/// start to the instant the target began executing (queueing lag). `status`
/// and `metadata` default so that snapshots written by older recorders,
/// which stored timing only, still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTiming {
    pub duration: Interval,
    pub offset: Interval,
    #[serde(default, skip_serializing_if = "TargetStatus::is_ok")]
    pub status: TargetStatus,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Name, id and duration envelope shared by plays and tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTiming {
    pub name: String,
    pub id: String,
    pub duration: Interval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub task: UnitTiming,
    pub hosts: BTreeMap<String, HostTiming>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEntry {
    pub play: UnitTiming,
    pub tasks: Vec<TaskEntry>,
}

/// Complete nested timing record for one run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunSnapshot {
    pub plays: Vec<PlayEntry>,
}

impl RunSnapshot {
    /// Load a snapshot from a JSON file; malformed input is fatal and the
    /// error carries the offending path
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("malformed snapshot {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)
            .with_context(|| format!("failed to write snapshot {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(secs: u32, micros: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_micro_opt(12, 0, secs, micros)
            .unwrap()
    }

    #[test]
    fn test_timestamp_serializes_with_six_fraction_digits() {
        let interval = Interval::open(ts(5, 250_000));
        let json = serde_json::to_value(&interval).unwrap();
        assert_eq!(json["start"], "2018-01-01T12:00:05.250000");
        assert!(json.get("end").is_none());
    }

    #[test]
    fn test_timestamp_parses_without_fraction() {
        // Python isoformat() drops ".%f" entirely when microsecond == 0
        let interval: Interval =
            serde_json::from_str(r#"{"start": "2018-01-01T12:00:05"}"#).unwrap();
        assert_eq!(interval.start, ts(5, 0));
    }

    #[test]
    fn test_interval_seconds_closed() {
        let interval = Interval::closed(ts(0, 0), ts(4, 500_000));
        assert_eq!(interval.seconds(), Some(4.5));
    }

    #[test]
    fn test_interval_seconds_open() {
        assert_eq!(Interval::open(ts(0, 0)).seconds(), None);
    }

    #[test]
    fn test_interval_seconds_negative() {
        // misordered caller clocks yield a negative span, not a panic
        let interval = Interval::closed(ts(3, 0), ts(1, 0));
        assert_eq!(interval.seconds(), Some(-2.0));
    }

    #[test]
    fn test_host_timing_loads_legacy_snapshot_without_status() {
        let json = r#"{
            "duration": {"start": "2018-01-01T12:00:01.000000", "end": "2018-01-01T12:00:04.000000"},
            "offset": {"start": "2018-01-01T12:00:00.000000", "end": "2018-01-01T12:00:01.000000"}
        }"#;
        let host: HostTiming = serde_json::from_str(json).unwrap();
        assert_eq!(host.status, TargetStatus::Ok);
        assert!(host.metadata.is_empty());
        assert_eq!(host.duration.seconds(), Some(3.0));
    }

    #[test]
    fn test_ok_status_is_omitted_from_wire() {
        // a fully-ok snapshot carries exactly the original field set
        let host = HostTiming {
            duration: Interval::closed(ts(1, 0), ts(2, 0)),
            offset: Interval::closed(ts(0, 0), ts(1, 0)),
            status: TargetStatus::Ok,
            metadata: serde_json::Map::new(),
        };
        let json = serde_json::to_string(&host).unwrap();
        assert!(!json.contains("status"));
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut hosts = BTreeMap::new();
        hosts.insert(
            "web1".to_string(),
            HostTiming {
                duration: Interval::closed(ts(1, 123_456), ts(4, 654_321)),
                offset: Interval::closed(ts(0, 0), ts(1, 123_456)),
                status: TargetStatus::Failed,
                metadata: serde_json::Map::new(),
            },
        );
        let snapshot = RunSnapshot {
            plays: vec![PlayEntry {
                play: UnitTiming {
                    name: "Deploy".to_string(),
                    id: "p-1".to_string(),
                    duration: Interval::closed(ts(0, 0), ts(4, 654_321)),
                },
                tasks: vec![TaskEntry {
                    task: UnitTiming {
                        name: "Copy files".to_string(),
                        id: "t-1".to_string(),
                        duration: Interval::closed(ts(0, 0), ts(4, 654_321)),
                    },
                    hosts,
                }],
            }],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let reloaded: RunSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, reloaded);
    }

    #[test]
    fn test_snapshot_serializes_as_top_level_array() {
        let snapshot = RunSnapshot::default();
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), "[]");
    }

    #[test]
    fn test_incomplete_play_round_trips_without_end() {
        let snapshot = RunSnapshot {
            plays: vec![PlayEntry {
                play: UnitTiming {
                    name: "Interrupted".to_string(),
                    id: "p-9".to_string(),
                    duration: Interval::open(ts(0, 0)),
                },
                tasks: vec![],
            }],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("\"end\""));
        let reloaded: RunSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.plays[0].play.duration.end, None);
    }

    #[test]
    fn test_load_reports_offending_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = RunSnapshot::load(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.json"));
    }
}
