//! View session endpoints
//!
//! A view holds one loaded trace and its collapse state. Clients create a
//! view, load traces into it and read projections that reflect their
//! collapse toggles.

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use types::{
    CollapseResponse, CreateViewResponse, LoadTraceRequest, ServiceColorResponse, SpansQuery,
};

use crate::api::extractors::{
    ValidatedJson, ValidatedPath, ValidatedQuery, ViewPath, ViewServicePath, ViewSpanPath,
};
use crate::api::types::ApiError;
use crate::data::TimeRange;
use crate::domain::traces::projections::summarize;
use crate::domain::traces::{
    RowView, ServiceGroup, SpanDetail, SpanRecord, TimeMarker, TraceSummary,
};
use crate::domain::{TraceView, ViewRegistry};

/// Shared state for view endpoints
#[derive(Clone)]
pub struct ViewsApiState {
    pub views: ViewRegistry,
}

impl ViewsApiState {
    fn view(&self, view_id: &str) -> Result<Arc<TraceView>, ApiError> {
        self.views
            .get(view_id)
            .ok_or_else(|| ApiError::view_not_found(view_id))
    }
}

pub fn routes(views: ViewRegistry) -> Router<()> {
    let state = ViewsApiState { views };

    Router::new()
        .route("/api/v1/views", post(create_view))
        .route("/api/v1/views/{view_id}", delete(delete_view))
        .route("/api/v1/views/{view_id}/trace", post(load_trace))
        .route("/api/v1/views/{view_id}/collapse/{span_id}", post(toggle_collapse))
        .route("/api/v1/views/{view_id}/timeline", get(get_timeline))
        .route("/api/v1/views/{view_id}/hierarchy", get(get_hierarchy))
        .route("/api/v1/views/{view_id}/spans", get(list_spans))
        .route("/api/v1/views/{view_id}/spans/{span_id}", get(get_span))
        .route("/api/v1/views/{view_id}/services", get(list_services))
        .route(
            "/api/v1/views/{view_id}/services/{service}/color",
            get(get_service_color),
        )
        .route("/api/v1/views/{view_id}/markers", get(get_markers))
        .with_state(state)
}

/// Create an empty view session
#[utoipa::path(
    post,
    path = "/api/v1/views",
    tag = "views",
    responses(
        (status = 201, description = "View created", body = CreateViewResponse)
    )
)]
pub async fn create_view(
    State(state): State<ViewsApiState>,
) -> (StatusCode, Json<CreateViewResponse>) {
    let (view_id, _) = state.views.create();
    (StatusCode::CREATED, Json(CreateViewResponse { view_id }))
}

/// Drop a view session
#[utoipa::path(
    delete,
    path = "/api/v1/views/{view_id}",
    tag = "views",
    params(("view_id" = String, Path, description = "View ID")),
    responses(
        (status = 204, description = "View deleted"),
        (status = 404, description = "View not found")
    )
)]
pub async fn delete_view(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewPath>,
) -> Result<StatusCode, ApiError> {
    if state.views.remove(&path.view_id) {
        tracing::debug!(view_id = %path.view_id, "View deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::view_not_found(&path.view_id))
    }
}

/// Load a trace into the view, resetting its collapse state
///
/// When loads overlap, only the most recently started one is installed;
/// earlier ones answer 409.
#[utoipa::path(
    post,
    path = "/api/v1/views/{view_id}/trace",
    tag = "views",
    params(("view_id" = String, Path, description = "View ID")),
    request_body = LoadTraceRequest,
    responses(
        (status = 200, description = "Trace loaded", body = TraceSummary),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "View or trace not found"),
        (status = 409, description = "Superseded by a newer load"),
        (status = 502, description = "Tracing backend failure")
    )
)]
pub async fn load_trace(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewPath>,
    ValidatedJson(body): ValidatedJson<LoadTraceRequest>,
) -> Result<Json<TraceSummary>, ApiError> {
    let view = state.view(&path.view_id)?;
    let range = TimeRange::new(body.from, body.to).map_err(ApiError::from_backend)?;

    let trace = view
        .load_trace(&body.trace_id, range)
        .await
        .map_err(ApiError::from_view)?;
    Ok(Json(summarize(&trace)))
}

/// Toggle a span's collapse state
#[utoipa::path(
    post,
    path = "/api/v1/views/{view_id}/collapse/{span_id}",
    tag = "views",
    params(
        ("view_id" = String, Path, description = "View ID"),
        ("span_id" = String, Path, description = "Span ID")
    ),
    responses(
        (status = 200, description = "New collapse state", body = CollapseResponse),
        (status = 404, description = "View not found")
    )
)]
pub async fn toggle_collapse(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewSpanPath>,
) -> Result<Json<CollapseResponse>, ApiError> {
    let view = state.view(&path.view_id)?;
    let collapsed = view.toggle_collapse(&path.span_id);
    Ok(Json(CollapseResponse {
        span_id: path.span_id,
        collapsed,
    }))
}

/// Visible timeline rows in depth-first order
#[utoipa::path(
    get,
    path = "/api/v1/views/{view_id}/timeline",
    tag = "views",
    params(("view_id" = String, Path, description = "View ID")),
    responses(
        (status = 200, description = "Timeline rows", body = Vec<RowView>),
        (status = 404, description = "View not found"),
        (status = 409, description = "No trace loaded")
    )
)]
pub async fn get_timeline(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewPath>,
) -> Result<Json<Vec<RowView>>, ApiError> {
    let view = state.view(&path.view_id)?;
    view.visible_timeline()
        .map(Json)
        .map_err(ApiError::from_view)
}

/// Hierarchy rows with depth
#[utoipa::path(
    get,
    path = "/api/v1/views/{view_id}/hierarchy",
    tag = "views",
    params(("view_id" = String, Path, description = "View ID")),
    responses(
        (status = 200, description = "Hierarchy rows", body = Vec<RowView>),
        (status = 404, description = "View not found"),
        (status = 409, description = "No trace loaded")
    )
)]
pub async fn get_hierarchy(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewPath>,
) -> Result<Json<Vec<RowView>>, ApiError> {
    let view = state.view(&path.view_id)?;
    view.hierarchy_rows().map(Json).map_err(ApiError::from_view)
}

/// All spans as a flat sorted list
#[utoipa::path(
    get,
    path = "/api/v1/views/{view_id}/spans",
    tag = "views",
    params(("view_id" = String, Path, description = "View ID"), SpansQuery),
    responses(
        (status = 200, description = "Span records", body = Vec<SpanRecord>),
        (status = 404, description = "View not found"),
        (status = 409, description = "No trace loaded")
    )
)]
pub async fn list_spans(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewPath>,
    ValidatedQuery(query): ValidatedQuery<SpansQuery>,
) -> Result<Json<Vec<SpanRecord>>, ApiError> {
    let view = state.view(&path.view_id)?;
    view.flat_rows(query.sort())
        .map(Json)
        .map_err(ApiError::from_view)
}

/// Everything known about one span
#[utoipa::path(
    get,
    path = "/api/v1/views/{view_id}/spans/{span_id}",
    tag = "views",
    params(
        ("view_id" = String, Path, description = "View ID"),
        ("span_id" = String, Path, description = "Span ID")
    ),
    responses(
        (status = 200, description = "Span detail", body = SpanDetail),
        (status = 404, description = "View or span not found"),
        (status = 409, description = "No trace loaded")
    )
)]
pub async fn get_span(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewSpanPath>,
) -> Result<Json<SpanDetail>, ApiError> {
    let view = state.view(&path.view_id)?;
    view.span_detail(&path.span_id)
        .map(Json)
        .map_err(ApiError::from_view)
}

/// Services in first-seen order with their colors and spans
#[utoipa::path(
    get,
    path = "/api/v1/views/{view_id}/services",
    tag = "views",
    params(("view_id" = String, Path, description = "View ID")),
    responses(
        (status = 200, description = "Service groups", body = Vec<ServiceGroup>),
        (status = 404, description = "View not found"),
        (status = 409, description = "No trace loaded")
    )
)]
pub async fn list_services(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewPath>,
) -> Result<Json<Vec<ServiceGroup>>, ApiError> {
    let view = state.view(&path.view_id)?;
    view.service_groups().map(Json).map_err(ApiError::from_view)
}

/// Color token for a service; the default color for unknown services
#[utoipa::path(
    get,
    path = "/api/v1/views/{view_id}/services/{service}/color",
    tag = "views",
    params(
        ("view_id" = String, Path, description = "View ID"),
        ("service" = String, Path, description = "Service name")
    ),
    responses(
        (status = 200, description = "Service color", body = ServiceColorResponse),
        (status = 404, description = "View not found")
    )
)]
pub async fn get_service_color(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewServicePath>,
) -> Result<Json<ServiceColorResponse>, ApiError> {
    let view = state.view(&path.view_id)?;
    let color = view.service_color(&path.service).to_string();
    Ok(Json(ServiceColorResponse {
        service: path.service,
        color,
    }))
}

/// Time axis markers for the loaded trace
#[utoipa::path(
    get,
    path = "/api/v1/views/{view_id}/markers",
    tag = "views",
    params(("view_id" = String, Path, description = "View ID")),
    responses(
        (status = 200, description = "Time markers", body = Vec<TimeMarker>),
        (status = 404, description = "View not found"),
        (status = 409, description = "No trace loaded")
    )
)]
pub async fn get_markers(
    State(state): State<ViewsApiState>,
    ValidatedPath(path): ValidatedPath<ViewPath>,
) -> Result<Json<Vec<TimeMarker>>, ApiError> {
    let view = state.view(&path.view_id)?;
    view.time_markers().map(Json).map_err(ApiError::from_view)
}
