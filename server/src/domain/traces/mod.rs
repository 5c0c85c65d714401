//! Trace reconstruction and timeline layout
//!
//! ```text
//!  raw spans ──▶ hierarchy::build ──▶ timeline::normalize ──▶ colors::assign_colors
//!                                                                      │
//!                         CollapseSet ──▶ projections ◀────────────────┘
//! ```
//!
//! - `model` - Span records, arena nodes, the `Trace` forest
//! - `hierarchy` - Parent/child reconstruction from a flat span set
//! - `timeline` - Relative offsets, layout percentages, time axis
//! - `colors` - Per-service palette assignment and grouping
//! - `collapse` - User collapse state and visibility
//! - `projections` - Timeline, hierarchy and flat row views
//! - `view` - A loaded trace plus its collapse state
//! - `registry` - Live view sessions

pub mod collapse;
pub mod colors;
pub mod hierarchy;
pub mod model;
pub mod projections;
pub mod registry;
pub mod timeline;
pub mod view;

#[cfg(test)]
mod tests;

pub use collapse::CollapseSet;
pub use colors::{DEFAULT_COLOR, ERROR_COLOR, PALETTE, ServiceColors, ServiceGroup};
pub use model::{Annotation, NodeIndex, SpanNode, SpanRecord, Trace};
pub use projections::{
    FlatSort, RowView, SortKey, SortOrder, SpanDetail, SpanRow, TraceSummary,
};
pub use registry::ViewRegistry;
pub use timeline::{MIN_VISIBLE_WIDTH, SpanLayout, TimeMarker};
pub use view::{TraceView, ViewError};

/// Build, normalize and color a trace from raw spans
pub fn reconstruct(records: Vec<SpanRecord>) -> Trace {
    let mut trace = hierarchy::build(records);
    timeline::normalize(&mut trace);
    trace.service_colors =
        colors::assign_colors(trace.nodes.iter().map(|n| n.record.service_name.as_str()));
    trace
}
