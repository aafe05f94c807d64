//! Line classification: recognizing event markers in raw log narration.
//!
//! Classification is a fixed, ordered table of patterns. Each pattern is a
//! permissive substring search paired with the shape of its captures, which
//! turns a match into an [`EventMarker`]. Order in the table is the order in
//! which the tracker applies markers found on the same line.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identifier embedded in brackets, e.g. `[1b4e28ba-2fa1-11d2-883f-0016d3cca427]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which knowledge lookup method an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KnowledgeMethod {
    One,
    Two,
}

impl KnowledgeMethod {
    /// Maps the numeric tag found in the log. Other method numbers are not tracked.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            _ => None,
        }
    }
}

/// Event category a marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Tool,
    Knowledge(KnowledgeMethod),
    LlmCall,
}

/// What a marker says about its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Start,
    End,
    Error,
    SkipSignal,
    DiscardSignal,
}

/// One recognized marker on a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMarker {
    pub category: Category,
    pub role: Role,
    pub id: NodeId,
}

/// How a pattern's captures map onto a marker.
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// Capture 1 is the identifier.
    Fixed(Category),
    /// Capture 1 is the method tag, capture 2 the identifier.
    Knowledge,
}

struct MarkerPattern {
    regex: Regex,
    shape: Shape,
    role: Role,
}

impl MarkerPattern {
    fn new(pattern: &str, shape: Shape, role: Role) -> Self {
        Self {
            regex: Regex::new(pattern).expect("valid marker regex"),
            shape,
            role,
        }
    }

    fn extract(&self, line: &str) -> Option<EventMarker> {
        let caps = self.regex.captures(line)?;
        let (category, id) = match self.shape {
            Shape::Fixed(category) => (category, &caps[1]),
            Shape::Knowledge => {
                let Some(method) = KnowledgeMethod::from_tag(&caps[1]) else {
                    tracing::trace!(method = &caps[1], "ignoring untracked knowledge method");
                    return None;
                };
                (Category::Knowledge(method), &caps[2])
            }
        };
        Some(EventMarker {
            category,
            role: self.role,
            id: NodeId::new(id),
        })
    }
}

const TOOL_STARTED: &str = r"tool_enhancement_node.*?\[([a-f0-9-]{36})\].*?started";
const TOOL_SKIP_SIGNAL: &str = r"In \[([a-f0-9-]{36})\].*?No tools has been called";
const TOOL_FINISHED: &str = r"Tool calls in \[([a-f0-9-]{36})\].*?finished";
const TOOL_FAILED: &str = r"In \[([a-f0-9-]{36})\].*?Tool .*?failed";
const KNOWLEDGE_STARTED: &str =
    r"knowledge_enhancement_method(\d+)_node.*?\[([a-f0-9-]{36})\].*?started";
const KNOWLEDGE_ENDED: &str =
    r"knowledge_enhancement_method(\d+)_node.*?\[([a-f0-9-]{36})\].*?ended";
const LLM_STARTED: &str = r"LLM call with tool messages \[([a-f0-9-]{36})\].*?started";
const LLM_ENDED: &str = r"LLM call with tool messages \[([a-f0-9-]{36})\].*?ended";
const DISCARD_SIGNAL: &str = r"Discarding method2 \[([a-f0-9-]{36})\].*?result due to";

static PATTERNS: LazyLock<Vec<MarkerPattern>> = LazyLock::new(|| {
    use Category::{LlmCall, Tool};
    let method2 = Category::Knowledge(KnowledgeMethod::Two);
    vec![
        MarkerPattern::new(TOOL_STARTED, Shape::Fixed(Tool), Role::Start),
        MarkerPattern::new(TOOL_SKIP_SIGNAL, Shape::Fixed(Tool), Role::SkipSignal),
        MarkerPattern::new(TOOL_FINISHED, Shape::Fixed(Tool), Role::End),
        MarkerPattern::new(TOOL_FAILED, Shape::Fixed(Tool), Role::Error),
        MarkerPattern::new(KNOWLEDGE_STARTED, Shape::Knowledge, Role::Start),
        MarkerPattern::new(KNOWLEDGE_ENDED, Shape::Knowledge, Role::End),
        MarkerPattern::new(LLM_STARTED, Shape::Fixed(LlmCall), Role::Start),
        MarkerPattern::new(LLM_ENDED, Shape::Fixed(LlmCall), Role::End),
        MarkerPattern::new(DISCARD_SIGNAL, Shape::Fixed(method2), Role::DiscardSignal),
    ]
});

/// Classifies a raw line into zero or more markers, in table order.
///
/// A line carrying both a tool "finished" and a tool "failed" marker yields
/// only the finished one.
pub fn classify_line(line: &str) -> Vec<EventMarker> {
    let mut markers: Vec<EventMarker> = PATTERNS
        .iter()
        .filter_map(|p| p.extract(line))
        .collect();

    let has_finished = markers
        .iter()
        .any(|m| m.category == Category::Tool && m.role == Role::End);
    if has_finished {
        markers.retain(|m| !(m.category == Category::Tool && m.role == Role::Error));
    }
    markers
}

/// Identifier of a tool "finished" marker on the line, if any.
pub fn finished_tool_id(line: &str) -> Option<NodeId> {
    find_marker(line, Category::Tool, Role::End)
}

/// Identifier of a knowledge-method-2 discard signal on the line, if any.
pub fn discarded_id(line: &str) -> Option<NodeId> {
    find_marker(line, Category::Knowledge(KnowledgeMethod::Two), Role::DiscardSignal)
}

fn find_marker(line: &str, category: Category, role: Role) -> Option<NodeId> {
    classify_line(line)
        .into_iter()
        .find(|m| m.category == category && m.role == role)
        .map(|m| m.id)
}
