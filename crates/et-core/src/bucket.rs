//! Partitioning records into named buckets.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::record::{EventRecord, Outcome, RecordKind};

/// A named grouping of records. One detail artifact is written per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketName {
    /// Finished tool calls joined with the LLM call that consumed them.
    ToolComplete,
    ToolFinished,
    ToolFailed,
    /// Skip-signalled tools and every interval left open at end of input.
    Skipped,
    LlmCall,
    Method1,
    /// Successful method-2 lookups only.
    Method2,
    Method2Discarded,
    Knowledge,
    /// Enhancement-level outcomes: tool failed/skipped/complete and knowledge.
    All,
    AllSuccess,
}

impl BucketName {
    pub const ALL: [Self; 11] = [
        Self::ToolComplete,
        Self::ToolFinished,
        Self::ToolFailed,
        Self::Skipped,
        Self::LlmCall,
        Self::Method1,
        Self::Method2,
        Self::Method2Discarded,
        Self::Knowledge,
        Self::All,
        Self::AllSuccess,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToolComplete => "tool_complete",
            Self::ToolFinished => "tool_finished",
            Self::ToolFailed => "tool_failed",
            Self::Skipped => "skipped",
            Self::LlmCall => "llm_call",
            Self::Method1 => "method1",
            Self::Method2 => "method2",
            Self::Method2Discarded => "method2_discarded",
            Self::Knowledge => "knowledge",
            Self::All => "all",
            Self::AllSuccess => "all_success",
        }
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets to which a record belongs.
fn memberships(record: &EventRecord) -> Vec<BucketName> {
    use BucketName as B;

    if record.outcome == Outcome::Skipped {
        let mut names = vec![B::Skipped];
        if record.kind.is_knowledge() {
            names.push(B::Knowledge);
        }
        if record.kind != RecordKind::LlmCall {
            names.push(B::All);
        }
        return names;
    }

    let failed = record.outcome == Outcome::Failed;
    match record.kind {
        RecordKind::ToolFinished => vec![B::ToolFinished],
        RecordKind::ToolFailed => vec![B::ToolFailed, B::All],
        RecordKind::ToolSkipped => vec![B::Skipped, B::All],
        RecordKind::ToolComplete => vec![B::ToolComplete, B::All, B::AllSuccess],
        RecordKind::LlmCall => vec![B::LlmCall],
        RecordKind::KnowledgeMethod1 if failed => vec![B::Method1, B::Knowledge, B::All],
        RecordKind::KnowledgeMethod1 => vec![B::Method1, B::Knowledge, B::All, B::AllSuccess],
        RecordKind::KnowledgeMethod2 if failed => {
            vec![B::Method2Discarded, B::Knowledge, B::All]
        }
        RecordKind::KnowledgeMethod2 => vec![B::Method2, B::Knowledge, B::All, B::AllSuccess],
    }
}

/// Records grouped by bucket, each list in emission order.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    lists: BTreeMap<BucketName, Vec<EventRecord>>,
}

impl Buckets {
    pub fn classify(records: &[EventRecord]) -> Self {
        let mut lists: BTreeMap<BucketName, Vec<EventRecord>> =
            BucketName::ALL.into_iter().map(|name| (name, Vec::new())).collect();

        for record in records {
            for name in memberships(record) {
                lists.entry(name).or_default().push(record.clone());
            }
        }
        Self { lists }
    }

    pub fn get(&self, name: BucketName) -> &[EventRecord] {
        self.lists.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (BucketName, &[EventRecord])> {
        self.lists.iter().map(|(name, records)| (*name, records.as_slice()))
    }
}
