//! Stateless trace snapshot
//!
//! Fetches, reconstructs and lays out a trace in one request, fully expanded.
//! Nothing is retained between calls; use a view session for collapse state.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::extractors::{TracePath, ValidatedPath, ValidatedQuery};
use crate::api::types::ApiError;
use crate::data::{TimeRange, TraceBackend, TraceQuery};
use crate::domain::reconstruct;
use crate::domain::traces::colors::service_groups;
use crate::domain::traces::projections::{decorate_all, summarize, visible_timeline};
use crate::domain::traces::timeline::time_markers;
use crate::domain::traces::{CollapseSet, RowView, ServiceGroup, TimeMarker, TraceSummary};

/// Shared state for the snapshot endpoint
#[derive(Clone)]
pub struct TracesApiState {
    pub backend: Arc<dyn TraceBackend>,
}

pub fn routes(backend: Arc<dyn TraceBackend>) -> Router<()> {
    Router::new()
        .route("/api/v1/traces/{trace_id}", get(get_trace))
        .with_state(TracesApiState { backend })
}

/// Optional time window in epoch milliseconds
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TimeRangeQuery {
    /// Lower bound on span start (epoch ms, inclusive)
    #[validate(range(min = 0, message = "from must be >= 0"))]
    pub from: Option<i64>,
    /// Upper bound on span start (epoch ms, inclusive)
    #[validate(range(min = 0, message = "to must be >= 0"))]
    pub to: Option<i64>,
}

impl TimeRangeQuery {
    pub fn to_range(&self) -> Result<TimeRange, ApiError> {
        TimeRange::new(self.from, self.to).map_err(ApiError::from_backend)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TraceSnapshotDto {
    pub summary: TraceSummary,
    pub services: Vec<ServiceGroup>,
    pub markers: Vec<TimeMarker>,
    pub timeline: Vec<RowView>,
}

/// Fetch and lay out a trace
#[utoipa::path(
    get,
    path = "/api/v1/traces/{trace_id}",
    tag = "traces",
    params(
        ("trace_id" = String, Path, description = "Trace ID"),
        TimeRangeQuery
    ),
    responses(
        (status = 200, description = "Trace snapshot", body = TraceSnapshotDto),
        (status = 400, description = "Invalid trace id or time range"),
        (status = 404, description = "Trace not found"),
        (status = 502, description = "Tracing backend failure")
    )
)]
pub async fn get_trace(
    State(state): State<TracesApiState>,
    ValidatedPath(path): ValidatedPath<TracePath>,
    ValidatedQuery(query): ValidatedQuery<TimeRangeQuery>,
) -> Result<Json<TraceSnapshotDto>, ApiError> {
    let range = query.to_range()?;
    let records = state
        .backend
        .fetch_spans(&TraceQuery::new(&path.trace_id, range))
        .await
        .map_err(ApiError::from_backend)?;

    let trace = reconstruct(records);
    let expanded = CollapseSet::new();
    let rows = visible_timeline(&trace, &expanded);

    tracing::debug!(
        trace_id = %path.trace_id,
        span_count = trace.len(),
        "Trace snapshot built"
    );

    Ok(Json(TraceSnapshotDto {
        summary: summarize(&trace),
        services: service_groups(&trace),
        markers: time_markers(trace.total_duration()),
        timeline: decorate_all(&trace, &expanded, &rows),
    }))
}
