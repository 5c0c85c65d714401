//! End-to-end tests for trace reconstruction and projections

use std::collections::HashSet;

use proptest::prelude::*;

use super::collapse::CollapseSet;
use super::colors::assign_colors;
use super::model::test_support::{span, span_in};
use super::model::{NodeIndex, SpanRecord, Trace};
use super::projections::{hierarchy_rows, visible_timeline};
use super::reconstruct;

// ============================================================================
// Helpers
// ============================================================================

/// Raw draw for one span: id slot, parent kind, parent slot, service, start, duration
type SpanDraw = (usize, u8, usize, u8, i64, u64);

fn span_draw() -> impl Strategy<Value = SpanDraw> {
    (
        any::<usize>(),
        0u8..5,
        any::<usize>(),
        0u8..4,
        -5_000i64..5_000,
        0u64..3_000,
    )
}

/// Span set whose parents may be earlier, later, missing, or the span itself
fn span_set(max: usize, unique: bool) -> impl Strategy<Value = Vec<SpanRecord>> {
    prop::collection::vec(span_draw(), 1..max).prop_map(move |draws| {
        let count = draws.len();
        draws
            .into_iter()
            .enumerate()
            .map(|(i, (id_slot, parent_kind, parent_slot, service, start, duration))| {
                let id = if unique {
                    format!("s{i}")
                } else {
                    format!("s{}", id_slot % count)
                };
                let parent = match parent_kind {
                    0 => None,
                    1 => Some("ghost".to_string()),
                    _ => Some(format!("s{}", parent_slot % count)),
                };
                span_in(
                    &id,
                    parent.as_deref(),
                    &format!("svc-{service}"),
                    start,
                    duration,
                )
            })
            .collect()
    })
}

fn row_ids(trace: &Trace, rows: &[super::SpanRow]) -> Vec<String> {
    rows.iter()
        .map(|r| trace.node(r.node).id().to_string())
        .collect()
}

/// How many times each node is referenced as a root or a child
fn placement_counts(trace: &Trace) -> Vec<usize> {
    let mut counts = vec![0usize; trace.len()];
    for &root in trace.roots() {
        counts[root] += 1;
    }
    for node in trace.nodes() {
        for &child in &node.children {
            counts[child] += 1;
        }
    }
    counts
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn test_forest_completeness(records in span_set(40, true)) {
        let count = records.len();
        let trace = reconstruct(records);

        prop_assert_eq!(trace.len(), count);
        prop_assert!(placement_counts(&trace).iter().all(|&c| c == 1));
        for (idx, node) in trace.nodes().iter().enumerate() {
            prop_assert_eq!(trace.index_of(node.id()), Some(idx));
        }
    }

    #[test]
    fn test_forest_is_acyclic(
        unique in span_set(30, true),
        repeated in span_set(30, false),
    ) {
        for records in [unique, repeated] {
            let trace = reconstruct(records);

            // Every node reachable from a root exactly once
            let mut seen: HashSet<NodeIndex> = HashSet::new();
            let mut stack: Vec<NodeIndex> = trace.roots().to_vec();
            while let Some(idx) = stack.pop() {
                prop_assert!(seen.insert(idx), "node reached twice");
                stack.extend(trace.node(idx).children.iter().copied());
            }
            prop_assert_eq!(seen.len(), trace.len());

            // Parent chains terminate
            for idx in 0..trace.len() {
                prop_assert!(trace.depth_of(idx) < trace.len());
            }
        }
    }

    #[test]
    fn test_timeline_non_negative_and_bounded(records in span_set(25, false)) {
        let trace = reconstruct(records);
        let max_duration = trace
            .nodes()
            .iter()
            .map(|n| n.record.duration_micros)
            .max()
            .unwrap_or(0);

        prop_assert!(trace.total_duration() >= max_duration);
        for node in trace.nodes() {
            let start = node.relative_start.unwrap();
            let end = node.relative_end.unwrap();
            prop_assert!(end >= start);
            prop_assert!(end <= trace.total_duration());
        }
    }

    #[test]
    fn test_visibility_matches_ancestor_membership(
        records in span_set(22, true),
        mask in prop::collection::vec(prop::bool::weighted(0.33), 22),
    ) {
        let trace = reconstruct(records);
        let collapsed: CollapseSet = trace
            .nodes()
            .iter()
            .zip(&mask)
            .filter(|(_, hit)| **hit)
            .map(|(n, _)| n.id().to_string())
            .collect();

        for idx in 0..trace.len() {
            let hidden_by_ancestor = trace
                .ancestors(idx)
                .any(|a| collapsed.is_collapsed(a.id()));
            prop_assert_eq!(collapsed.is_visible(&trace, idx), !hidden_by_ancestor);
        }

        // The timeline holds exactly the visible nodes
        let shown: HashSet<NodeIndex> = visible_timeline(&trace, &collapsed)
            .into_iter()
            .map(|r| r.node)
            .collect();
        for idx in 0..trace.len() {
            prop_assert_eq!(shown.contains(&idx), collapsed.is_visible(&trace, idx));
        }
    }

    #[test]
    fn test_color_determinism(records in span_set(50, false)) {
        let names = || records.iter().map(|r| r.service_name.as_str());

        let first = assign_colors(names());
        let second = assign_colors(names());
        prop_assert_eq!(first.services(), second.services());
        for service in first.services() {
            prop_assert_eq!(first.color_of(service), second.color_of(service));
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

fn scenario_a() -> Vec<SpanRecord> {
    vec![span("1", None, 0, 100_000), span("2", Some("1"), 10_000, 50_000)]
}

#[test]
fn test_parent_and_child() {
    let trace = reconstruct(scenario_a());

    assert_eq!(trace.roots().len(), 1);
    let root = trace.node(trace.roots()[0]);
    assert_eq!(root.id(), "1");
    assert_eq!(root.children.len(), 1);
    assert_eq!(trace.node(root.children[0]).id(), "2");
    assert_eq!(trace.total_duration(), 100_000);
    assert_eq!(trace.get("2").unwrap().relative_start, Some(10_000));
}

#[test]
fn test_lone_span_with_missing_parent() {
    let trace = reconstruct(vec![span("x", Some("missing"), 0, 1_000)]);
    assert_eq!(trace.roots().len(), 1);
    assert_eq!(trace.node(trace.roots()[0]).id(), "x");
}

#[test]
fn test_duplicate_id_keeps_last() {
    let mut v2 = span_in("a", None, "second", 5, 20);
    v2.operation_name = "v2".to_string();
    let trace = reconstruct(vec![span_in("a", None, "first", 0, 10), v2.clone()]);

    assert_eq!(trace.get("a").unwrap().record, v2);
}

#[test]
fn test_collapsed_root_hides_child() {
    let trace = reconstruct(scenario_a());
    let mut collapsed = CollapseSet::new();
    collapsed.toggle("1");

    let timeline = visible_timeline(&trace, &collapsed);
    assert_eq!(row_ids(&trace, &timeline), vec!["1"]);

    let hierarchy = hierarchy_rows(&trace, &collapsed);
    assert_eq!(row_ids(&trace, &hierarchy), vec!["1"]);
    assert!(trace.get("1").unwrap().has_children());

    collapsed.toggle("1");
    let expanded = hierarchy_rows(&trace, &collapsed);
    assert_eq!(row_ids(&trace, &expanded), vec!["1", "2"]);
}

#[test]
fn test_overwritten_duplicate_service_gets_no_color() {
    let trace = reconstruct(vec![
        span_in("a", None, "frontend", 0, 10),
        span_in("b", Some("a"), "stale", 1, 2),
        span_in("b", Some("a"), "inventory", 1, 2),
    ]);

    assert_eq!(trace.service_colors().services(), ["frontend", "inventory"]);
    assert_eq!(trace.service_colors().len(), 2);
    assert!(
        super::colors::service_groups(&trace)
            .iter()
            .all(|g| g.span_count > 0)
    );
}

#[test]
fn test_empty_span_set() {
    let trace = reconstruct(Vec::new());
    assert!(trace.roots().is_empty());
    assert_eq!(trace.total_duration(), 0);
    assert!(visible_timeline(&trace, &CollapseSet::new()).is_empty());
}

#[test]
fn test_multiple_roots_keep_input_order() {
    let trace = reconstruct(vec![
        span("late", None, 500, 10),
        span("early", None, 0, 10),
        span("child", Some("early"), 1, 1),
    ]);
    let rows = visible_timeline(&trace, &CollapseSet::new());
    assert_eq!(row_ids(&trace, &rows), vec!["late", "early", "child"]);
}
