//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{health, traces, views};
use crate::domain::traces::{
    Annotation, RowView, ServiceGroup, SortKey, SortOrder, SpanDetail, SpanLayout, SpanRecord,
    TimeMarker, TraceSummary,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TraceLens API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Distributed trace reconstruction and timeline layout"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "traces", description = "Stateless trace snapshots"),
        (name = "views", description = "Trace view sessions with collapse state")
    ),
    paths(
        health::health,
        traces::get_trace,
        views::create_view,
        views::delete_view,
        views::load_trace,
        views::toggle_collapse,
        views::get_timeline,
        views::get_hierarchy,
        views::list_spans,
        views::get_span,
        views::list_services,
        views::get_service_color,
        views::get_markers,
    ),
    components(schemas(
        health::HealthResponse,
        traces::TraceSnapshotDto,
        views::types::CreateViewResponse,
        views::types::LoadTraceRequest,
        views::types::CollapseResponse,
        views::types::ServiceColorResponse,
        Annotation,
        SpanRecord,
        SpanLayout,
        RowView,
        TraceSummary,
        SpanDetail,
        ServiceGroup,
        TimeMarker,
        SortKey,
        SortOrder,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}
