//! Linking a finished tool call to the LLM call that consumed its result.
//!
//! The log never cross-references the two; the only signal is narration
//! order. An LLM call is linked to a tool when the line immediately before
//! its start marker is that tool's "finished" line, and the tool is the most
//! recently finished one that has not been linked yet.

use std::collections::HashMap;

use crate::marker::{NodeId, finished_tool_id};
use crate::record::{Composite, EventRecord, Outcome, RecordKind};

#[derive(Debug, Default)]
pub struct Correlator {
    last_finished: Option<NodeId>,
    /// Finished tool records still available for a tool-complete record.
    finished: HashMap<NodeId, EventRecord>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers a tool-finished record as a link candidate.
    pub fn tool_finished(&mut self, record: &EventRecord) {
        self.last_finished = Some(record.node_id.clone());
        self.finished.insert(record.node_id.clone(), record.clone());
    }

    /// Called on an LLM start marker with the physical line before it.
    ///
    /// Consumes the pending tool when that line is its finished marker.
    pub fn link_llm_start(&mut self, previous_line: Option<&str>) -> Option<NodeId> {
        let pending = self.last_finished.as_ref()?;
        let previous = finished_tool_id(previous_line?)?;
        if &previous != pending {
            return None;
        }
        tracing::debug!(tool_id = %previous, "linked LLM call to finished tool");
        self.last_finished = None;
        Some(previous)
    }

    /// Builds the tool-complete record for a closed, linked LLM call.
    ///
    /// Each finished tool backs at most one tool-complete record.
    pub fn complete(&mut self, llm: &EventRecord) -> Option<EventRecord> {
        let tool_id = llm.linked_tool.as_ref()?;
        let tool = self.finished.remove(tool_id)?;

        Some(EventRecord {
            kind: RecordKind::ToolComplete,
            node_id: tool.node_id.clone(),
            start_time: tool.start_time,
            end_time: llm.end_time,
            duration: tool.duration + llm.duration,
            start_line: tool.start_line,
            end_line: llm.end_line,
            outcome: Outcome::Succeeded,
            unterminated: false,
            linked_tool: None,
            composite: Some(Composite {
                llm_id: llm.node_id.clone(),
                tool_duration: tool.duration,
                llm_duration: llm.duration,
            }),
        })
    }
}
