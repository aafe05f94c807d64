//! Closed enhancement-event records.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::marker::{KnowledgeMethod, NodeId};
use crate::timestamp::format_timestamp;

/// Decimal places kept for durations in serialized output.
pub const DECIMAL_PLACES: i32 = 3;

/// Record category, as written in the `type` field of serialized records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    ToolFinished,
    ToolFailed,
    ToolSkipped,
    ToolComplete,
    LlmCall,
    KnowledgeMethod1,
    KnowledgeMethod2,
}

impl RecordKind {
    /// Every kind, in report order.
    pub const ALL: [Self; 7] = [
        Self::ToolFinished,
        Self::ToolFailed,
        Self::ToolSkipped,
        Self::ToolComplete,
        Self::LlmCall,
        Self::KnowledgeMethod1,
        Self::KnowledgeMethod2,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToolFinished => "tool_enhancement_finished",
            Self::ToolFailed => "tool_enhancement_failed",
            Self::ToolSkipped => "tool_enhancement_skipped",
            Self::ToolComplete => "tool_enhancement_complete",
            Self::LlmCall => "llm_call",
            Self::KnowledgeMethod1 => "knowledge_enhancement_method1",
            Self::KnowledgeMethod2 => "knowledge_enhancement_method2",
        }
    }

    pub const fn knowledge(method: KnowledgeMethod) -> Self {
        match method {
            KnowledgeMethod::One => Self::KnowledgeMethod1,
            KnowledgeMethod::Two => Self::KnowledgeMethod2,
        }
    }

    pub const fn is_tool(&self) -> bool {
        matches!(
            self,
            Self::ToolFinished | Self::ToolFailed | Self::ToolSkipped | Self::ToolComplete
        )
    }

    pub const fn is_knowledge(&self) -> bool {
        matches!(self, Self::KnowledgeMethod1 | Self::KnowledgeMethod2)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownRecordKind(s.to_string()))
    }
}

impl Serialize for RecordKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown record type strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown record type: {0}")]
pub struct UnknownRecordKind(String);

/// How an interval ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Outcome {
    #[default]
    Succeeded,
    /// Tool error, or a method-2 result discarded right after it ended.
    Failed,
    /// Skip signal, or still open when the log ran out.
    Skipped,
}

/// Component durations of a tool-complete record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    pub llm_id: NodeId,
    pub tool_duration: TimeDelta,
    pub llm_duration: TimeDelta,
}

/// One closed interval. Immutable once emitted by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub kind: RecordKind,
    pub node_id: NodeId,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: TimeDelta,
    pub start_line: usize,
    pub end_line: usize,
    pub outcome: Outcome,
    /// Synthesized at end of input rather than closed by a terminator.
    pub unterminated: bool,
    /// For LLM calls: the finished tool whose result the call consumed.
    pub linked_tool: Option<NodeId>,
    pub composite: Option<Composite>,
}

impl EventRecord {
    /// A record closed by a terminator, with duration `end - start`.
    pub fn closed(
        kind: RecordKind,
        node_id: NodeId,
        (start_time, start_line): (NaiveDateTime, usize),
        (end_time, end_line): (NaiveDateTime, usize),
        outcome: Outcome,
    ) -> Self {
        Self {
            kind,
            node_id,
            start_time,
            end_time,
            duration: end_time - start_time,
            start_line,
            end_line,
            outcome,
            unterminated: false,
            linked_tool: None,
            composite: None,
        }
    }

    /// A zero-length skip record for an interval still open at end of input.
    pub fn unterminated(
        kind: RecordKind,
        node_id: NodeId,
        start_time: NaiveDateTime,
        start_line: usize,
    ) -> Self {
        Self {
            kind,
            node_id,
            start_time,
            end_time: start_time,
            duration: TimeDelta::zero(),
            start_line,
            end_line: start_line,
            outcome: Outcome::Skipped,
            unterminated: true,
            linked_tool: None,
            composite: None,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        delta_secs(self.duration)
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed)
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped)
    }

    /// Serialized form used in the detail artifacts.
    pub fn to_json(&self) -> RecordJson {
        let carries_error_flag = self.kind.is_knowledge()
            || matches!(
                self.kind,
                RecordKind::ToolFinished | RecordKind::ToolFailed | RecordKind::ToolSkipped
            );

        let (tool_id, llm_id, tool_duration, llm_duration) = match (&self.composite, self.kind) {
            (Some(c), _) => (
                Some(Some(self.node_id.clone())),
                Some(c.llm_id.clone()),
                Some(round_secs(delta_secs(c.tool_duration))),
                Some(round_secs(delta_secs(c.llm_duration))),
            ),
            (None, RecordKind::LlmCall) => (Some(self.linked_tool.clone()), None, None, None),
            (None, _) => (None, None, None, None),
        };

        RecordJson {
            kind: self.kind,
            node_id: self.node_id.clone(),
            start_time: format_timestamp(&self.start_time),
            end_time: format_timestamp(&self.end_time),
            duration_seconds: round_secs(self.duration_secs()),
            start_line: self.start_line,
            end_line: self.end_line,
            has_error: carries_error_flag.then(|| self.is_failed()),
            tool_id,
            llm_id,
            tool_duration,
            llm_duration,
            skipped: self.unterminated,
        }
    }
}

/// JSON shape of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordJson {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub node_id: NodeId,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_error: Option<bool>,
    /// Present on LLM calls (null when unlinked) and tool-complete records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<Option<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

/// Seconds in a time delta, to microsecond precision.
#[allow(clippy::cast_precision_loss)]
pub fn delta_secs(delta: TimeDelta) -> f64 {
    delta
        .num_microseconds()
        .map_or_else(|| delta.num_milliseconds() as f64 / 1e3, |us| us as f64 / 1e6)
}

/// Rounds seconds to [`DECIMAL_PLACES`].
pub fn round_secs(secs: f64) -> f64 {
    let scale = 10f64.powi(DECIMAL_PLACES);
    (secs * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insta::assert_snapshot;

    fn ts(s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_micro_opt(12, 0, s, micro)
            .unwrap()
    }

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    #[test]
    fn kind_strings_roundtrip() {
        for kind in RecordKind::ALL {
            let parsed: RecordKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("tool_enhancement".parse::<RecordKind>().is_err());
    }

    #[test]
    fn closed_record_duration_is_end_minus_start() {
        let record = EventRecord::closed(
            RecordKind::KnowledgeMethod1,
            id("k"),
            (ts(1, 250_000), 3),
            (ts(4, 0), 9),
            Outcome::Succeeded,
        );
        assert!((record.duration_secs() - 2.75).abs() < f64::EPSILON);
        assert_eq!((record.start_line, record.end_line), (3, 9));
    }

    #[test]
    fn unterminated_record_is_zero_length_skip() {
        let record = EventRecord::unterminated(RecordKind::ToolSkipped, id("t"), ts(5, 0), 7);
        assert_eq!(record.duration, TimeDelta::zero());
        assert_eq!(record.start_line, record.end_line);
        assert!(record.is_skipped());
        assert!(record.unterminated);
    }

    #[test]
    fn rounds_to_three_places() {
        assert!((round_secs(1.234_56) - 1.235).abs() < f64::EPSILON);
        assert!((round_secs(0.000_4) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tool_record_json() {
        let record = EventRecord::closed(
            RecordKind::ToolFailed,
            id("11111111-2222-3333-4444-555555555555"),
            (ts(0, 0), 1),
            (ts(1, 500_000), 4),
            Outcome::Failed,
        );
        let json = serde_json::to_string_pretty(&record.to_json()).unwrap();
        assert_snapshot!(json, @r#"
        {
          "type": "tool_enhancement_failed",
          "node_id": "11111111-2222-3333-4444-555555555555",
          "start_time": "2025-01-01 12:00:00.000000",
          "end_time": "2025-01-01 12:00:01.500000",
          "duration_seconds": 1.5,
          "start_line": 1,
          "end_line": 4,
          "has_error": true
        }
        "#);
    }

    #[test]
    fn unlinked_llm_call_serializes_null_tool_id() {
        let record = EventRecord::closed(
            RecordKind::LlmCall,
            id("l"),
            (ts(0, 0), 2),
            (ts(2, 0), 3),
            Outcome::Succeeded,
        );
        let value = serde_json::to_value(record.to_json()).unwrap();
        assert!(value["tool_id"].is_null());
        assert!(value.get("tool_id").is_some());
        assert!(value.get("has_error").is_none());
    }

    #[test]
    fn composite_json_keeps_component_durations() {
        let mut record = EventRecord::closed(
            RecordKind::ToolComplete,
            id("t"),
            (ts(0, 0), 1),
            (ts(6, 0), 8),
            Outcome::Succeeded,
        );
        record.duration = TimeDelta::milliseconds(4_500);
        record.composite = Some(Composite {
            llm_id: id("l"),
            tool_duration: TimeDelta::milliseconds(1_250),
            llm_duration: TimeDelta::milliseconds(3_250),
        });

        let json = record.to_json();
        assert_eq!(json.tool_id, Some(Some(id("t"))));
        assert_eq!(json.llm_id, Some(id("l")));
        assert_eq!(json.tool_duration, Some(1.25));
        assert_eq!(json.llm_duration, Some(3.25));
        assert_eq!(json.duration_seconds, 4.5);
        assert_eq!(json.has_error, None);
    }
}
