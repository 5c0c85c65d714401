//! Timeline normalizer
//!
//! Places every span on a shared timeline relative to the earliest start in
//! the trace. Offsets are stored on the nodes; percentage layout is computed
//! on demand from those offsets.

use serde::Serialize;
use utoipa::ToSchema;

use super::model::{SpanNode, Trace};

/// Minimum bar width in percent, so zero-length spans stay visible
pub const MIN_VISIBLE_WIDTH: f64 = 0.5;

/// Number of intervals the time axis is divided into
const MARKER_INTERVALS: f64 = 6.0;

/// Horizontal placement of a span bar, in percent of the trace duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SpanLayout {
    pub left_percent: f64,
    pub width_percent: f64,
}

impl SpanLayout {
    pub const ZERO: SpanLayout = SpanLayout {
        left_percent: 0.0,
        width_percent: 0.0,
    };
}

/// A tick on the time axis
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TimeMarker {
    /// Offset from trace start in milliseconds
    pub offset_ms: u64,
    pub position_percent: f64,
    pub label: String,
}

/// Compute origin, total duration and per-node relative offsets.
///
/// Idempotent. An empty trace gets origin 0 and duration 0.
pub fn normalize(trace: &mut Trace) {
    let Some(origin) = trace.nodes.iter().map(|n| n.record.start_timestamp).min() else {
        trace.origin = 0;
        trace.total_duration = 0;
        return;
    };

    let latest_end = trace
        .nodes
        .iter()
        .map(|n| n.record.end_timestamp())
        .max()
        .unwrap_or(origin);

    trace.origin = origin;
    trace.total_duration = offset(origin, latest_end);

    for node in &mut trace.nodes {
        let relative_start = offset(origin, node.record.start_timestamp);
        node.relative_start = Some(relative_start);
        node.relative_end = Some(relative_start.saturating_add(node.record.duration_micros));
    }

    tracing::debug!(
        origin,
        total_duration = trace.total_duration,
        "Normalized trace timeline"
    );
}

/// Non-negative distance from `origin` to `timestamp`, saturating at u64 bounds
fn offset(origin: i64, timestamp: i64) -> u64 {
    let diff = i128::from(timestamp) - i128::from(origin);
    u64::try_from(diff.max(0)).unwrap_or(u64::MAX)
}

/// Layout of a node within its trace
pub fn layout(trace: &Trace, node: &SpanNode) -> SpanLayout {
    let total = trace.total_duration;
    if total == 0 {
        return SpanLayout::ZERO;
    }
    let total = total as f64;
    let start = node.relative_start.unwrap_or(0) as f64;
    let duration = node.record.duration_micros as f64;

    SpanLayout {
        left_percent: start / total * 100.0,
        width_percent: (duration / total * 100.0).max(MIN_VISIBLE_WIDTH),
    }
}

/// Time axis ticks in whole milliseconds, roughly six intervals wide
pub fn time_markers(total_duration_micros: u64) -> Vec<TimeMarker> {
    if total_duration_micros == 0 {
        return Vec::new();
    }

    let total_ms = total_duration_micros as f64 / 1000.0;
    let step = ((total_ms / MARKER_INTERVALS).ceil() as u64).max(1);
    let last = total_ms.floor() as u64;

    (0..=last)
        .step_by(step as usize)
        .map(|offset_ms| TimeMarker {
            offset_ms,
            position_percent: offset_ms as f64 * 1000.0 / total_duration_micros as f64 * 100.0,
            label: format!("{offset_ms}ms"),
        })
        .collect()
}
