//! View projections
//!
//! Pure functions from `(&Trace, &CollapseSet)` to rows. Nothing is cached;
//! every call walks the forest again with an explicit work stack.
//!
//! | Projection          | Order                   | Collapse handling                          |
//! |---------------------|-------------------------|--------------------------------------------|
//! | `visible_timeline`  | pre-order over roots    | visible nodes only, no descent if collapsed |
//! | `hierarchy_rows`    | pre-order over roots    | collapsed node listed, descendants skipped |
//! | `flat_rows`         | input order, then sort  | ignored                                    |

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::collapse::CollapseSet;
use super::colors::ERROR_COLOR;
use super::model::{Annotation, NodeIndex, SpanRecord, Trace};
use super::timeline::{SpanLayout, layout};
use crate::utils::time::{format_duration_micros, format_timestamp_micros};

// ============================================================================
// TREE PROJECTIONS
// ============================================================================

/// One emitted row: a node and its depth (0 for roots)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanRow {
    pub node: NodeIndex,
    pub depth: usize,
}

/// Rows of the waterfall timeline
pub fn visible_timeline(trace: &Trace, collapsed: &CollapseSet) -> Vec<SpanRow> {
    walk(trace, collapsed, |row| collapsed.is_visible(trace, row.node))
}

/// Rows of the indented hierarchy list
pub fn hierarchy_rows(trace: &Trace, collapsed: &CollapseSet) -> Vec<SpanRow> {
    walk(trace, collapsed, |_| true)
}

/// Pre-order walk that does not descend below collapsed nodes
fn walk<F>(trace: &Trace, collapsed: &CollapseSet, emit: F) -> Vec<SpanRow>
where
    F: Fn(&SpanRow) -> bool,
{
    let mut rows = Vec::with_capacity(trace.len());
    let mut stack: Vec<SpanRow> = trace
        .roots()
        .iter()
        .rev()
        .map(|&node| SpanRow { node, depth: 0 })
        .collect();

    while let Some(row) = stack.pop() {
        if emit(&row) {
            rows.push(row);
        }
        let node = trace.node(row.node);
        if collapsed.is_collapsed(node.id()) {
            continue;
        }
        stack.extend(node.children.iter().rev().map(|&child| SpanRow {
            node: child,
            depth: row.depth + 1,
        }));
    }
    rows
}

// ============================================================================
// FLAT PROJECTION
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    StartTime,
    Duration,
    Service,
    Operation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort applied to the flat span list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl FlatSort {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    fn compare(&self, a: &SpanRecord, b: &SpanRecord) -> Ordering {
        let ordering = match self.key {
            SortKey::StartTime => a.start_timestamp.cmp(&b.start_timestamp),
            SortKey::Duration => a.duration_micros.cmp(&b.duration_micros),
            SortKey::Service => a.service_name.cmp(&b.service_name),
            SortKey::Operation => a.operation_name.cmp(&b.operation_name),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start_time" => Ok(Self::StartTime),
            "duration" => Ok(Self::Duration),
            "service" => Ok(Self::Service),
            "operation" => Ok(Self::Operation),
            other => Err(format!(
                "unknown sort key '{other}' (expected start_time, duration, service, operation)"
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StartTime => "start_time",
            Self::Duration => "duration",
            Self::Service => "service",
            Self::Operation => "operation",
        })
    }
}

/// Input records as received, stable-sorted. Hierarchy and collapse state are ignored.
pub fn flat_rows(trace: &Trace, sort: FlatSort) -> Vec<SpanRecord> {
    let mut rows = trace.records().to_vec();
    rows.sort_by(|a, b| sort.compare(a, b));
    rows
}

// ============================================================================
// DECORATED ROWS
// ============================================================================

/// A tree row with everything needed to draw it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RowView {
    pub span_id: String,
    pub parent_id: Option<String>,
    pub operation_name: String,
    pub service_name: String,
    pub depth: usize,
    pub relative_start: u64,
    pub duration_micros: u64,
    pub duration: String,
    pub is_error: bool,
    pub has_children: bool,
    pub collapsed: bool,
    /// Service color
    pub color: String,
    /// Color the bar is drawn in
    pub bar_color: String,
    pub layout: SpanLayout,
}

/// Bar color: error color for error spans, service color otherwise
pub fn bar_color(trace: &Trace, record: &SpanRecord) -> &'static str {
    if record.is_error {
        ERROR_COLOR
    } else {
        trace.service_colors().color_of(&record.service_name)
    }
}

pub fn decorate(trace: &Trace, collapsed: &CollapseSet, row: SpanRow) -> RowView {
    let node = trace.node(row.node);
    let record = &node.record;
    RowView {
        span_id: record.id.clone(),
        parent_id: node.parent.map(|p| trace.node(p).id().to_string()),
        operation_name: record.operation_name.clone(),
        service_name: record.service_name.clone(),
        depth: row.depth,
        relative_start: node.relative_start.unwrap_or(0),
        duration_micros: record.duration_micros,
        duration: format_duration_micros(record.duration_micros),
        is_error: record.is_error,
        has_children: node.has_children(),
        collapsed: collapsed.is_collapsed(&record.id),
        color: trace.service_colors().color_of(&record.service_name).to_string(),
        bar_color: bar_color(trace, record).to_string(),
        layout: layout(trace, node),
    }
}

pub fn decorate_all(trace: &Trace, collapsed: &CollapseSet, rows: &[SpanRow]) -> Vec<RowView> {
    rows.iter()
        .map(|&row| decorate(trace, collapsed, row))
        .collect()
}

// ============================================================================
// SUMMARY & DETAIL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TraceSummary {
    pub trace_id: Option<String>,
    pub span_count: usize,
    pub service_count: usize,
    pub root_count: usize,
    pub error_count: usize,
    /// Earliest start, microseconds since epoch
    pub origin: i64,
    pub start_time: String,
    pub total_duration_micros: u64,
    pub total_duration: String,
}

pub fn summarize(trace: &Trace) -> TraceSummary {
    TraceSummary {
        trace_id: trace.trace_id().map(String::from),
        span_count: trace.len(),
        service_count: trace.service_colors().len(),
        root_count: trace.roots().len(),
        error_count: trace.nodes().iter().filter(|n| n.record.is_error).count(),
        origin: trace.origin(),
        start_time: format_timestamp_micros(trace.origin()),
        total_duration_micros: trace.total_duration(),
        total_duration: format_duration_micros(trace.total_duration()),
    }
}

/// Everything known about one span
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpanDetail {
    pub span: SpanRecord,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub depth: usize,
    pub relative_start: u64,
    pub relative_end: u64,
    pub duration: String,
    pub start_time: String,
    pub collapsed: bool,
    pub visible: bool,
    pub color: String,
    pub bar_color: String,
    pub layout: SpanLayout,
    /// Chronological
    pub annotations: Vec<Annotation>,
}

pub fn span_detail(trace: &Trace, collapsed: &CollapseSet, span_id: &str) -> Option<SpanDetail> {
    let idx = trace.index_of(span_id)?;
    let node = trace.node(idx);
    let record = &node.record;

    Some(SpanDetail {
        span: record.clone(),
        parent_id: node.parent.map(|p| trace.node(p).id().to_string()),
        child_ids: node
            .children
            .iter()
            .map(|&c| trace.node(c).id().to_string())
            .collect(),
        depth: trace.depth_of(idx),
        relative_start: node.relative_start.unwrap_or(0),
        relative_end: node.relative_end.unwrap_or(0),
        duration: format_duration_micros(record.duration_micros),
        start_time: format_timestamp_micros(record.start_timestamp),
        collapsed: collapsed.is_collapsed(span_id),
        visible: collapsed.is_visible(trace, idx),
        color: trace.service_colors().color_of(&record.service_name).to_string(),
        bar_color: bar_color(trace, record).to_string(),
        layout: layout(trace, node),
        annotations: record.sorted_annotations(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traces::model::test_support::{span, span_in};
    use crate::domain::traces::reconstruct;

    fn ids(trace: &Trace, rows: &[SpanRow]) -> Vec<String> {
        rows.iter()
            .map(|r| trace.node(r.node).id().to_string())
            .collect()
    }

    fn sample() -> Trace {
        reconstruct(vec![
            span("a", None, 0, 100),
            span("b", Some("a"), 10, 50),
            span("c", Some("b"), 20, 10),
            span("d", Some("a"), 70, 20),
            span("e", None, 5, 5),
        ])
    }

    #[test]
    fn test_visible_timeline_preorder() {
        let trace = sample();
        let rows = visible_timeline(&trace, &CollapseSet::new());
        assert_eq!(ids(&trace, &rows), vec!["a", "b", "c", "d", "e"]);
        let depths: Vec<_> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_visible_timeline_hides_collapsed_subtree() {
        let trace = sample();
        let collapsed: CollapseSet = ["b"].into_iter().collect();
        let rows = visible_timeline(&trace, &collapsed);
        assert_eq!(ids(&trace, &rows), vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn test_hierarchy_rows_flag_collapsed() {
        let trace = sample();
        let collapsed: CollapseSet = ["a"].into_iter().collect();
        let rows = hierarchy_rows(&trace, &collapsed);
        assert_eq!(ids(&trace, &rows), vec!["a", "e"]);

        let views = decorate_all(&trace, &collapsed, &rows);
        assert!(views[0].collapsed);
        assert!(views[0].has_children);
        assert!(!views[1].collapsed);
        assert!(!views[1].has_children);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut records = vec![span("s0", None, 0, 10)];
        for i in 1..5_000 {
            records.push(span(&format!("s{i}"), Some(&format!("s{}", i - 1)), i, 1));
        }
        let trace = reconstruct(records);
        let rows = visible_timeline(&trace, &CollapseSet::new());
        assert_eq!(rows.len(), 5_000);
        assert_eq!(rows.last().unwrap().depth, 4_999);
    }

    #[test]
    fn test_flat_rows_sorting_is_stable() {
        let trace = reconstruct(vec![
            span_in("x", None, "db", 30, 10),
            span_in("y", None, "api", 10, 10),
            span_in("z", None, "api", 20, 5),
        ]);

        let by_start = flat_rows(&trace, FlatSort::default());
        assert_eq!(
            by_start.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["y", "z", "x"]
        );

        let by_duration_desc = flat_rows(&trace, FlatSort::new(SortKey::Duration, SortOrder::Desc));
        assert_eq!(
            by_duration_desc.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["x", "y", "z"]
        );

        let by_service = flat_rows(&trace, FlatSort::new(SortKey::Service, SortOrder::Asc));
        assert_eq!(
            by_service.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["y", "z", "x"]
        );
    }

    #[test]
    fn test_flat_rows_keep_duplicates() {
        let trace = reconstruct(vec![span("a", None, 0, 1), span("a", None, 0, 2)]);
        assert_eq!(flat_rows(&trace, FlatSort::default()).len(), 2);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("duration".parse::<SortKey>().unwrap(), SortKey::Duration);
        assert!("bogus".parse::<SortKey>().is_err());
        assert_eq!(SortKey::StartTime.to_string(), "start_time");
    }

    #[test]
    fn test_error_span_bar_color() {
        let mut failing = span_in("a", None, "api", 0, 10);
        failing.is_error = true;
        let trace = reconstruct(vec![failing]);
        let row = decorate(&trace, &CollapseSet::new(), SpanRow { node: 0, depth: 0 });
        assert_eq!(row.bar_color, ERROR_COLOR);
        assert_eq!(row.color, "#1976D2");
    }

    #[test]
    fn test_summary() {
        let mut records = vec![
            span_in("a", None, "api", 1_000, 2_000),
            span_in("b", Some("a"), "db", 1_500, 500),
        ];
        records[1].is_error = true;
        let summary = summarize(&reconstruct(records));

        assert_eq!(summary.trace_id.as_deref(), Some("trace-1"));
        assert_eq!(summary.span_count, 2);
        assert_eq!(summary.service_count, 2);
        assert_eq!(summary.root_count, 1);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.total_duration, "2.00ms");
    }

    #[test]
    fn test_span_detail() {
        let mut records = vec![span("a", None, 0, 100), span("b", Some("a"), 40, 20)];
        records[1].annotations = vec![
            Annotation {
                timestamp: 55,
                value: "sr".to_string(),
            },
            Annotation {
                timestamp: 45,
                value: "cs".to_string(),
            },
        ];
        let trace = reconstruct(records);
        let collapsed: CollapseSet = ["a"].into_iter().collect();

        let detail = span_detail(&trace, &collapsed, "b").unwrap();
        assert_eq!(detail.parent_id.as_deref(), Some("a"));
        assert_eq!(detail.depth, 1);
        assert_eq!(detail.relative_start, 40);
        assert_eq!(detail.relative_end, 60);
        assert!(!detail.visible);
        assert_eq!(detail.annotations[0].value, "cs");
        assert_eq!(detail.layout.left_percent, 40.0);

        assert!(span_detail(&trace, &collapsed, "missing").is_none());
    }
}
