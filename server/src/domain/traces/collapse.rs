//! Collapse state
//!
//! A span is either expanded (absent from the set) or collapsed (present).
//! Visibility walks the full ancestor chain on every call.

use std::collections::HashSet;

use super::model::{NodeIndex, Trace};

/// Span ids collapsed by the user in one view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseSet {
    collapsed: HashSet<String>,
}

impl CollapseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a span between expanded and collapsed. Returns true if now collapsed.
    ///
    /// Ids are not checked against any trace.
    pub fn toggle(&mut self, span_id: &str) -> bool {
        if self.collapsed.remove(span_id) {
            false
        } else {
            self.collapsed.insert(span_id.to_string());
            true
        }
    }

    pub fn is_collapsed(&self, span_id: &str) -> bool {
        self.collapsed.contains(span_id)
    }

    pub fn clear(&mut self) {
        self.collapsed.clear();
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    /// Collapsed ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.collapsed.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// False iff some ancestor of the node is collapsed. Roots are always visible.
    pub fn is_visible(&self, trace: &Trace, index: NodeIndex) -> bool {
        !trace
            .ancestors(index)
            .any(|ancestor| self.is_collapsed(ancestor.id()))
    }
}

impl<S: Into<String>> FromIterator<S> for CollapseSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            collapsed: iter.into_iter().map(Into::into).collect(),
        }
    }
}
