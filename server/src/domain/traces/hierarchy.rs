//! Hierarchy builder
//!
//! Rebuilds the parent/child forest from a flat, unordered span set.
//! Malformed input never fails the build:
//!
//! | Input                         | Outcome                                      |
//! |-------------------------------|----------------------------------------------|
//! | `parent_id` absent or empty   | root                                         |
//! | `parent_id` not in the set    | root (dangling parent)                       |
//! | duplicate `id`                | one node, last record wins                   |
//! | link that would close a cycle | root                                         |

use std::collections::HashMap;

use super::model::{NodeIndex, SpanNode, SpanRecord, Trace};

/// Build the span forest.
///
/// Every distinct span id ends up exactly once in the forest, either in
/// `roots` or in exactly one parent's `children`. Timings and colors are left
/// untouched; see `timeline::normalize` and `colors::assign_colors`.
pub fn build(records: Vec<SpanRecord>) -> Trace {
    let mut nodes: Vec<SpanNode> = Vec::with_capacity(records.len());
    let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(records.len());

    for record in &records {
        match index.get(&record.id) {
            Some(&existing) => {
                tracing::warn!(span_id = %record.id, "Duplicate span id, keeping last record");
                nodes[existing].record = record.clone();
            }
            None => {
                index.insert(record.id.clone(), nodes.len());
                nodes.push(SpanNode::new(record.clone()));
            }
        }
    }

    let mut roots = Vec::new();
    for idx in 0..nodes.len() {
        match resolve_parent(&nodes, &index, idx) {
            Some(parent) => {
                nodes[idx].parent = Some(parent);
                nodes[parent].children.push(idx);
            }
            None => roots.push(idx),
        }
    }

    tracing::debug!(
        span_count = records.len(),
        node_count = nodes.len(),
        root_count = roots.len(),
        "Built span hierarchy"
    );

    Trace {
        nodes,
        roots,
        index,
        records,
        ..Default::default()
    }
}

/// Resolve the parent of `idx` against links made so far, or `None` for a root
fn resolve_parent(
    nodes: &[SpanNode],
    index: &HashMap<String, NodeIndex>,
    idx: NodeIndex,
) -> Option<NodeIndex> {
    let record = &nodes[idx].record;
    let parent_id = record.parent_id.as_deref().filter(|p| !p.is_empty())?;

    let Some(&parent) = index.get(parent_id) else {
        tracing::debug!(
            span_id = %record.id,
            parent_id,
            "Parent span not in trace, treating as root"
        );
        return None;
    };

    if closes_cycle(nodes, idx, parent) {
        tracing::warn!(
            span_id = %record.id,
            parent_id,
            "Parent link would create a cycle, treating as root"
        );
        return None;
    }

    Some(parent)
}

/// True if `idx` is `parent` or one of its already-linked ancestors
fn closes_cycle(nodes: &[SpanNode], idx: NodeIndex, parent: NodeIndex) -> bool {
    let mut cursor = Some(parent);
    while let Some(current) = cursor {
        if current == idx {
            return true;
        }
        cursor = nodes[current].parent;
    }
    false
}
