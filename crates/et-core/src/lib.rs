//! Enhancement-event extraction from agent execution logs.
//!
//! The pipeline runs strictly left to right:
//! - Timestamp extraction and line classification
//! - Interval tracking with tool → LLM correlation
//! - Bucketing and count/duration statistics

pub mod bucket;
mod correlate;
pub mod extract;
pub mod marker;
pub mod record;
pub mod report;
pub mod stats;
pub mod timestamp;
pub mod tracker;
pub mod window;

pub use bucket::{BucketName, Buckets};
pub use correlate::Correlator;
pub use extract::{ExtractError, extract_file, extract_lines};
pub use marker::{Category, EventMarker, KnowledgeMethod, NodeId, Role, classify_line};
pub use record::{EventRecord, Outcome, RecordJson, RecordKind};
pub use report::{BucketArtifact, Report};
pub use stats::{BucketStats, RollUp, Summary};
pub use timestamp::{extract_timestamp, format_timestamp};
pub use tracker::{Diagnostics, Extraction, IntervalTracker};
pub use window::{Frame, LineWindow};
