//! Trace view session
//!
//! Holds the currently loaded trace and its collapse state. Loads race
//! freely; the most recently started one wins:
//!
//! ```text
//!   load A ──ticket 1──▶ fetch ─────────────────────▶ ticket != 2, discard
//!   load B ──────ticket 2──▶ fetch ──▶ install B
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use super::collapse::CollapseSet;
use super::colors::{DEFAULT_COLOR, ServiceGroup, service_groups};
use super::model::{SpanRecord, Trace};
use super::projections::{
    FlatSort, RowView, SpanDetail, TraceSummary, decorate_all, flat_rows, hierarchy_rows,
    span_detail, summarize, visible_timeline,
};
use super::reconstruct;
use super::timeline::{TimeMarker, time_markers};
use crate::data::{BackendError, TimeRange, TraceBackend, TraceQuery};

#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A newer load started while this one was in flight
    #[error("Load of trace {0} was superseded by a newer request")]
    Superseded(String),

    #[error("No trace loaded")]
    NotLoaded,

    #[error("Span not found: {0}")]
    SpanNotFound(String),
}

#[derive(Default)]
struct ViewState {
    trace: Option<Arc<Trace>>,
    collapsed: CollapseSet,
}

/// One user's view of one trace at a time
pub struct TraceView {
    backend: Arc<dyn TraceBackend>,
    generation: AtomicU64,
    state: Mutex<ViewState>,
}

impl TraceView {
    pub fn new(backend: Arc<dyn TraceBackend>) -> Self {
        Self {
            backend,
            generation: AtomicU64::new(0),
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Fetch, rebuild and install a trace, resetting the collapse state
    pub async fn load_trace(
        &self,
        trace_id: &str,
        range: TimeRange,
    ) -> Result<Arc<Trace>, ViewError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = TraceQuery::new(trace_id, range);

        let fetched = self.backend.fetch_spans(&query).await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(trace_id, ticket, "Discarding stale trace load");
            return Err(ViewError::Superseded(trace_id.to_string()));
        }
        let records = fetched?;
        let trace = Arc::new(reconstruct(records));

        let mut state = self.state.lock();
        // A newer load may have started during reconstruction
        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(trace_id, ticket, "Discarding stale trace load");
            return Err(ViewError::Superseded(trace_id.to_string()));
        }
        state.trace = Some(trace.clone());
        state.collapsed.clear();

        tracing::debug!(
            trace_id,
            span_count = trace.len(),
            root_count = trace.roots().len(),
            "Trace loaded"
        );
        Ok(trace)
    }

    /// Flip a span's collapse state. Returns true if it is now collapsed.
    pub fn toggle_collapse(&self, span_id: &str) -> bool {
        self.state.lock().collapsed.toggle(span_id)
    }

    pub fn trace(&self) -> Option<Arc<Trace>> {
        self.state.lock().trace.clone()
    }

    pub fn collapsed(&self) -> CollapseSet {
        self.state.lock().collapsed.clone()
    }

    fn snapshot(&self) -> Result<(Arc<Trace>, CollapseSet), ViewError> {
        let state = self.state.lock();
        let trace = state.trace.clone().ok_or(ViewError::NotLoaded)?;
        Ok((trace, state.collapsed.clone()))
    }

    pub fn visible_timeline(&self) -> Result<Vec<RowView>, ViewError> {
        let (trace, collapsed) = self.snapshot()?;
        let rows = visible_timeline(&trace, &collapsed);
        Ok(decorate_all(&trace, &collapsed, &rows))
    }

    pub fn hierarchy_rows(&self) -> Result<Vec<RowView>, ViewError> {
        let (trace, collapsed) = self.snapshot()?;
        let rows = hierarchy_rows(&trace, &collapsed);
        Ok(decorate_all(&trace, &collapsed, &rows))
    }

    pub fn flat_rows(&self, sort: FlatSort) -> Result<Vec<SpanRecord>, ViewError> {
        let (trace, _) = self.snapshot()?;
        Ok(flat_rows(&trace, sort))
    }

    /// Color token for a service; the default color when unknown or nothing is loaded
    pub fn service_color(&self, service_name: &str) -> &'static str {
        self.trace()
            .map(|trace| trace.service_colors().color_of(service_name))
            .unwrap_or(DEFAULT_COLOR)
    }

    pub fn service_groups(&self) -> Result<Vec<ServiceGroup>, ViewError> {
        let (trace, _) = self.snapshot()?;
        Ok(service_groups(&trace))
    }

    pub fn time_markers(&self) -> Result<Vec<TimeMarker>, ViewError> {
        let (trace, _) = self.snapshot()?;
        Ok(time_markers(trace.total_duration()))
    }

    pub fn summary(&self) -> Result<TraceSummary, ViewError> {
        let (trace, _) = self.snapshot()?;
        Ok(summarize(&trace))
    }

    pub fn span_detail(&self, span_id: &str) -> Result<SpanDetail, ViewError> {
        let (trace, collapsed) = self.snapshot()?;
        span_detail(&trace, &collapsed, span_id)
            .ok_or_else(|| ViewError::SpanNotFound(span_id.to_string()))
    }
}
