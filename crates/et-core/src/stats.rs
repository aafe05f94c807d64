//! Count and duration statistics over buckets and record categories.
//!
//! Skip records contribute to `skipped_count` only. Their duration is zero by
//! convention rather than measured, so they stay out of the totals, the
//! average and the min/max.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::record::{EventRecord, Outcome, RecordKind, round_secs};

fn rounded<S: Serializer>(secs: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_secs(*secs))
}

/// Aggregate over a list of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketStats {
    /// Successful records.
    pub count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    #[serde(serialize_with = "rounded")]
    pub total_time: f64,
    /// `total_time / (count + failed_count)`, 0 when both are zero.
    #[serde(serialize_with = "rounded")]
    pub avg_time: f64,
    #[serde(serialize_with = "rounded")]
    pub min_time: f64,
    #[serde(serialize_with = "rounded")]
    pub max_time: f64,
}

impl BucketStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a EventRecord>) -> Self {
        let mut stats = Self::default();
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for record in records {
            match record.outcome {
                Outcome::Skipped => {
                    stats.skipped_count += 1;
                    continue;
                }
                Outcome::Failed => stats.failed_count += 1,
                Outcome::Succeeded => stats.count += 1,
            }
            let secs = record.duration_secs();
            stats.total_time += secs;
            min = Some(min.map_or(secs, |m| m.min(secs)));
            max = Some(max.map_or(secs, |m| m.max(secs)));
        }

        stats.avg_time = average(stats.total_time, stats.count + stats.failed_count);
        stats.min_time = min.unwrap_or(0.0);
        stats.max_time = max.unwrap_or(0.0);
        stats
    }

    /// Number of records of any outcome.
    pub const fn total(&self) -> usize {
        self.count + self.failed_count + self.skipped_count
    }

    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[allow(clippy::cast_precision_loss)]
fn average(total: f64, n: usize) -> f64 {
    if n == 0 { 0.0 } else { total / n as f64 }
}

/// Roll-up across several categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RollUp {
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    #[serde(serialize_with = "rounded")]
    pub total_time: f64,
    /// `total_time / total`, 0 when empty.
    #[serde(serialize_with = "rounded")]
    pub avg_time: f64,
}

impl RollUp {
    pub fn combine<'a>(parts: impl IntoIterator<Item = &'a BucketStats>) -> Self {
        let mut rollup = parts.into_iter().fold(Self::default(), |mut acc, s| {
            acc.total += s.total();
            acc.success_count += s.count;
            acc.failed_count += s.failed_count;
            acc.skipped_count += s.skipped_count;
            acc.total_time += s.total_time;
            acc
        });
        rollup.avg_time = average(rollup.total_time, rollup.total);
        rollup
    }
}

/// The statistics artifact: per-category stats plus roll-ups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Categories with at least one record.
    #[serde(flatten)]
    pub categories: BTreeMap<RecordKind, BucketStats>,
    #[serde(rename = "tool_enhancement_summary")]
    pub tools: RollUp,
    #[serde(rename = "knowledge_enhancement_summary")]
    pub knowledge: RollUp,
    pub total: RollUp,
}

impl Summary {
    pub fn from_records(records: &[EventRecord]) -> Self {
        let per_kind: BTreeMap<RecordKind, BucketStats> = RecordKind::ALL
            .into_iter()
            .map(|kind| {
                let stats = BucketStats::from_records(records.iter().filter(|r| r.kind == kind));
                (kind, stats)
            })
            .collect();

        let select = |pred: fn(&RecordKind) -> bool| {
            RollUp::combine(per_kind.iter().filter(|(k, _)| pred(k)).map(|(_, s)| s))
        };
        let tools = select(RecordKind::is_tool);
        let knowledge = select(RecordKind::is_knowledge);
        let total = RollUp::combine(per_kind.values());

        let categories = per_kind.into_iter().filter(|(_, s)| !s.is_empty()).collect();

        Self {
            categories,
            tools,
            knowledge,
            total,
        }
    }

    pub fn category(&self, kind: RecordKind) -> BucketStats {
        self.categories.get(&kind).copied().unwrap_or_default()
    }
}
