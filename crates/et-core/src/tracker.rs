//! Interval state machine over classified log lines.
//!
//! Each (category, identifier) moves absent → open → closed. Start markers
//! open an interval; a matching terminator closes it and emits an
//! [`EventRecord`]. Anything still open when input runs out becomes a
//! zero-length skip record in [`IntervalTracker::finish`].
//!
//! # Edge policies
//!
//! - A repeated tool start for an open identifier is ignored; knowledge and
//!   LLM starts re-arm the start time instead.
//! - A "No tools has been called" signal seen for an identifier turns a later
//!   "finished" terminator into a skip. An error terminator always fails.
//! - A method-2 interval is failed when the very next physical line discards
//!   the same identifier. Method 1 ignores discard signals. A discard that
//!   shows up two or more lines later is missed.
//! - Terminators with nothing open are dropped and counted as orphans.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::correlate::Correlator;
use crate::marker::{
    Category, EventMarker, KnowledgeMethod, NodeId, Role, classify_line, discarded_id,
};
use crate::record::{EventRecord, Outcome, RecordKind};
use crate::timestamp::extract_timestamp;
use crate::window::Frame;

/// Counters describing what the pass saw but did not turn into records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub lines: usize,
    /// Lines with no timestamp or no recognized marker.
    pub inert_lines: usize,
    pub orphan_terminators: usize,
    pub unterminated: usize,
}

/// Result of one full pass.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Records in emission order.
    pub records: Vec<EventRecord>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy)]
struct OpenInterval {
    start_time: NaiveDateTime,
    start_line: usize,
}

#[derive(Debug, Clone)]
struct OpenLlmCall {
    interval: OpenInterval,
    linked_tool: Option<NodeId>,
}

type Stamp = (NaiveDateTime, usize);

#[derive(Debug, Default)]
pub struct IntervalTracker {
    tools: HashMap<NodeId, OpenInterval>,
    knowledge: HashMap<(KnowledgeMethod, NodeId), OpenInterval>,
    llm_calls: HashMap<NodeId, OpenLlmCall>,
    skip_signals: HashSet<NodeId>,
    correlator: Correlator,
    records: Vec<EventRecord>,
    diagnostics: Diagnostics,
}

impl IntervalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one line. Lines without a timestamp are inert.
    pub fn process(&mut self, frame: Frame<'_>) {
        self.diagnostics.lines += 1;

        let Some(timestamp) = extract_timestamp(frame.current) else {
            self.diagnostics.inert_lines += 1;
            return;
        };
        let markers = classify_line(frame.current);
        if markers.is_empty() {
            self.diagnostics.inert_lines += 1;
            return;
        }

        let at = (timestamp, frame.number);
        for marker in markers {
            self.apply(marker, at, frame);
        }
    }

    fn apply(&mut self, marker: EventMarker, at: Stamp, frame: Frame<'_>) {
        let EventMarker { category, role, id } = marker;
        match (category, role) {
            (Category::Tool, Role::Start) => self.open_tool(id, at),
            (Category::Tool, Role::SkipSignal) => {
                self.skip_signals.insert(id);
            }
            (Category::Tool, Role::End) => self.close_tool(id, at, false),
            (Category::Tool, Role::Error) => self.close_tool(id, at, true),
            (Category::Knowledge(method), Role::Start) => self.open_knowledge(method, id, at),
            (Category::Knowledge(method), Role::End) => {
                self.close_knowledge(method, id, at, frame.next);
            }
            (Category::LlmCall, Role::Start) => self.open_llm(id, at, frame.previous),
            (Category::LlmCall, Role::End) => self.close_llm(id, at),
            // Discard signals are only read as lookahead from an "ended" line.
            (_, Role::DiscardSignal)
            | (Category::Knowledge(_) | Category::LlmCall, Role::Error | Role::SkipSignal) => {}
        }
    }

    fn open_tool(&mut self, id: NodeId, (start_time, start_line): Stamp) {
        match self.tools.entry(id) {
            Entry::Occupied(entry) => {
                tracing::debug!(
                    id = %entry.key(),
                    line = start_line,
                    "ignoring repeated tool start"
                );
            }
            Entry::Vacant(entry) => {
                entry.insert(OpenInterval {
                    start_time,
                    start_line,
                });
            }
        }
    }

    fn close_tool(&mut self, id: NodeId, at: Stamp, errored: bool) {
        let Some(open) = self.tools.remove(&id) else {
            self.orphan(Category::Tool, &id, at.1);
            return;
        };

        let (kind, outcome) = if errored {
            (RecordKind::ToolFailed, Outcome::Failed)
        } else if self.skip_signals.contains(&id) {
            (RecordKind::ToolSkipped, Outcome::Skipped)
        } else {
            (RecordKind::ToolFinished, Outcome::Succeeded)
        };

        let start = (open.start_time, open.start_line);
        let record = EventRecord::closed(kind, id, start, at, outcome);
        if kind == RecordKind::ToolFinished {
            self.correlator.tool_finished(&record);
        }
        self.records.push(record);
    }

    fn open_knowledge(
        &mut self,
        method: KnowledgeMethod,
        id: NodeId,
        (start_time, start_line): Stamp,
    ) {
        let open = OpenInterval {
            start_time,
            start_line,
        };
        if let Some(previous) = self.knowledge.insert((method, id), open) {
            tracing::debug!(
                ?method,
                line = start_line,
                previous_line = previous.start_line,
                "re-armed knowledge interval"
            );
        }
    }

    fn close_knowledge(
        &mut self,
        method: KnowledgeMethod,
        id: NodeId,
        at: Stamp,
        next: Option<&str>,
    ) {
        let key = (method, id);
        let Some(open) = self.knowledge.remove(&key) else {
            self.orphan(Category::Knowledge(method), &key.1, at.1);
            return;
        };
        let (_, id) = key;

        let discarded = method == KnowledgeMethod::Two
            && next.and_then(discarded_id).is_some_and(|discarded| discarded == id);
        let outcome = if discarded {
            Outcome::Failed
        } else {
            Outcome::Succeeded
        };

        self.records.push(EventRecord::closed(
            RecordKind::knowledge(method),
            id,
            (open.start_time, open.start_line),
            at,
            outcome,
        ));
    }

    fn open_llm(&mut self, id: NodeId, (start_time, start_line): Stamp, previous: Option<&str>) {
        let linked = self.correlator.link_llm_start(previous);
        let interval = OpenInterval {
            start_time,
            start_line,
        };

        match self.llm_calls.entry(id) {
            Entry::Occupied(mut entry) => {
                tracing::debug!(id = %entry.key(), line = start_line, "re-armed LLM call");
                let open = entry.get_mut();
                open.interval = interval;
                if linked.is_some() {
                    open.linked_tool = linked;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(OpenLlmCall {
                    interval,
                    linked_tool: linked,
                });
            }
        }
    }

    fn close_llm(&mut self, id: NodeId, at: Stamp) {
        let Some(open) = self.llm_calls.remove(&id) else {
            self.orphan(Category::LlmCall, &id, at.1);
            return;
        };

        let mut record = EventRecord::closed(
            RecordKind::LlmCall,
            id,
            (open.interval.start_time, open.interval.start_line),
            at,
            Outcome::Succeeded,
        );
        record.linked_tool = open.linked_tool;

        let complete = self.correlator.complete(&record);
        self.records.push(record);
        self.records.extend(complete);
    }

    fn orphan(&mut self, category: Category, id: &NodeId, line: usize) {
        self.diagnostics.orphan_terminators += 1;
        tracing::debug!(?category, %id, line, "ignoring terminator with no open interval");
    }

    /// Ends the pass, turning every still-open interval into a skip record.
    pub fn finish(mut self) -> Extraction {
        let mut leftovers: Vec<EventRecord> = Vec::new();

        for (id, open) in self.tools.drain() {
            leftovers.push(EventRecord::unterminated(
                RecordKind::ToolSkipped,
                id,
                open.start_time,
                open.start_line,
            ));
        }
        for ((method, id), open) in self.knowledge.drain() {
            leftovers.push(EventRecord::unterminated(
                RecordKind::knowledge(method),
                id,
                open.start_time,
                open.start_line,
            ));
        }
        for (id, open) in self.llm_calls.drain() {
            leftovers.push(EventRecord::unterminated(
                RecordKind::LlmCall,
                id,
                open.interval.start_time,
                open.interval.start_line,
            ));
        }

        leftovers.sort_by(|a, b| (a.start_line, a.kind).cmp(&(b.start_line, b.kind)));
        for record in &leftovers {
            tracing::debug!(
                kind = %record.kind,
                id = %record.node_id,
                line = record.start_line,
                "unterminated interval"
            );
        }

        self.diagnostics.unterminated = leftovers.len();
        self.records.extend(leftovers);

        Extraction {
            records: self.records,
            diagnostics: self.diagnostics,
        }
    }
}
