//! Serializable artifacts built from a finished extraction.

use serde::Serialize;

use crate::bucket::{BucketName, Buckets};
use crate::record::{RecordJson, delta_secs, round_secs};
use crate::stats::{BucketStats, Summary};
use crate::tracker::Extraction;

/// Average component durations across tool-complete records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeAverages {
    pub avg_tool_time: f64,
    pub avg_llm_time: f64,
}

/// Detail artifact for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketArtifact {
    pub stats: BucketStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeAverages>,
    pub records: Vec<RecordJson>,
}

/// Everything derived from one log.
#[derive(Debug, Clone)]
pub struct Report {
    pub extraction: Extraction,
    pub buckets: Buckets,
    pub summary: Summary,
}

impl Report {
    pub fn build(extraction: Extraction) -> Self {
        let buckets = Buckets::classify(&extraction.records);
        let summary = Summary::from_records(&extraction.records);
        Self {
            extraction,
            buckets,
            summary,
        }
    }

    pub fn artifact(&self, name: BucketName) -> BucketArtifact {
        let records = self.buckets.get(name);
        let composite = (name == BucketName::ToolComplete && !records.is_empty()).then(|| {
            let parts: Vec<_> = records.iter().filter_map(|r| r.composite.as_ref()).collect();
            #[allow(clippy::cast_precision_loss)]
            let n = parts.len().max(1) as f64;
            let tool: f64 = parts.iter().map(|c| delta_secs(c.tool_duration)).sum();
            let llm: f64 = parts.iter().map(|c| delta_secs(c.llm_duration)).sum();
            CompositeAverages {
                avg_tool_time: round_secs(tool / n),
                avg_llm_time: round_secs(llm / n),
            }
        });

        BucketArtifact {
            stats: BucketStats::from_records(records),
            composite,
            records: records.iter().map(|r| r.to_json()).collect(),
        }
    }

    /// Every bucket's artifact, in [`BucketName::ALL`] order.
    pub fn artifacts(&self) -> impl Iterator<Item = (BucketName, BucketArtifact)> + '_ {
        BucketName::ALL
            .into_iter()
            .map(|name| (name, self.artifact(name)))
    }
}
