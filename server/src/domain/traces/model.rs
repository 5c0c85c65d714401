//! Span and trace model
//!
//! `SpanRecord` is the raw input as received from the tracing backend.
//! `Trace` owns every `SpanNode` in one dense arena; parent/child links are
//! arena indices, never references, so the forest has a single owner and
//! traversals are side-effect free.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::colors::ServiceColors;

/// Index of a node inside `Trace::nodes`
pub type NodeIndex = usize;

/// A timestamped annotation attached to a span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Annotation {
    /// Microseconds since epoch
    pub timestamp: i64,
    pub value: String,
}

/// One operation execution within a distributed trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SpanRecord {
    pub id: String,
    pub trace_id: String,
    /// `None` marks a root candidate
    pub parent_id: Option<String>,
    pub operation_name: String,
    pub service_name: String,
    /// Microseconds since epoch
    pub start_timestamp: i64,
    pub duration_micros: u64,
    pub is_error: bool,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Source order, not necessarily chronological
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl SpanRecord {
    /// Absolute end timestamp in microseconds (saturating)
    pub fn end_timestamp(&self) -> i64 {
        let duration = i64::try_from(self.duration_micros).unwrap_or(i64::MAX);
        self.start_timestamp.saturating_add(duration)
    }

    /// Annotations sorted chronologically (stable for equal timestamps)
    pub fn sorted_annotations(&self) -> Vec<Annotation> {
        let mut annotations = self.annotations.clone();
        annotations.sort_by_key(|a| a.timestamp);
        annotations
    }
}

/// A span placed in the reconstructed forest
#[derive(Debug, Clone)]
pub struct SpanNode {
    pub record: SpanRecord,
    /// Resolved parent; `None` for roots (including dangling parents)
    pub parent: Option<NodeIndex>,
    /// Encounter order during build, not chronological
    pub children: Vec<NodeIndex>,
    /// Offset from the trace origin; set by the timeline normalizer
    pub relative_start: Option<u64>,
    pub relative_end: Option<u64>,
}

impl SpanNode {
    pub(crate) fn new(record: SpanRecord) -> Self {
        Self {
            record,
            parent: None,
            children: Vec::new(),
            relative_start: None,
            relative_end: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A trace reconstructed from a flat span set
///
/// Ephemeral: rebuilt on every fetch and never persisted.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub(crate) nodes: Vec<SpanNode>,
    pub(crate) roots: Vec<NodeIndex>,
    pub(crate) index: HashMap<String, NodeIndex>,
    /// Input records exactly as received (duplicates included)
    pub(crate) records: Vec<SpanRecord>,
    pub(crate) origin: i64,
    pub(crate) total_duration: u64,
    pub(crate) service_colors: ServiceColors,
}

impl Trace {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of distinct spans in the forest
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[SpanNode] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> &SpanNode {
        &self.nodes[index]
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    pub fn root_nodes(&self) -> impl Iterator<Item = &SpanNode> {
        self.roots.iter().map(|&idx| &self.nodes[idx])
    }

    pub fn index_of(&self, span_id: &str) -> Option<NodeIndex> {
        self.index.get(span_id).copied()
    }

    /// Look up a span by id
    pub fn get(&self, span_id: &str) -> Option<&SpanNode> {
        self.index_of(span_id).map(|idx| &self.nodes[idx])
    }

    pub fn records(&self) -> &[SpanRecord] {
        &self.records
    }

    /// Earliest span start in microseconds (0 when empty)
    pub fn origin(&self) -> i64 {
        self.origin
    }

    /// Microseconds between the earliest start and the latest end
    pub fn total_duration(&self) -> u64 {
        self.total_duration
    }

    pub fn service_colors(&self) -> &ServiceColors {
        &self.service_colors
    }

    /// Trace id of the first record, if any
    pub fn trace_id(&self) -> Option<&str> {
        self.records.first().map(|r| r.trace_id.as_str())
    }

    /// Depth of a node (0 for roots)
    pub fn depth_of(&self, index: NodeIndex) -> usize {
        self.ancestors(index).count()
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, index: NodeIndex) -> Ancestors<'_> {
        Ancestors {
            trace: self,
            next: self.nodes[index].parent,
        }
    }
}

/// Iterator over the resolved ancestor chain of a node
pub struct Ancestors<'a> {
    trace: &'a Trace,
    next: Option<NodeIndex>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a SpanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = &self.trace.nodes[idx];
        self.next = node.parent;
        Some(node)
    }
}
