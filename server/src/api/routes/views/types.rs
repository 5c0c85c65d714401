//! View session API types

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::core::constants::MAX_ID_LENGTH;
use crate::domain::traces::{FlatSort, SortKey, SortOrder};

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateViewResponse {
    pub view_id: String,
}

/// Body for loading a trace into a view
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoadTraceRequest {
    #[validate(length(min = 1, max = MAX_ID_LENGTH, message = "trace_id must be 1-256 characters"))]
    pub trace_id: String,
    /// Lower bound on span start (epoch ms, inclusive)
    #[validate(range(min = 0, message = "from must be >= 0"))]
    pub from: Option<i64>,
    /// Upper bound on span start (epoch ms, inclusive)
    #[validate(range(min = 0, message = "to must be >= 0"))]
    pub to: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollapseResponse {
    pub span_id: String,
    /// State after the toggle
    pub collapsed: bool,
}

/// Sort for the flat span list
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SpansQuery {
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

impl SpansQuery {
    pub fn sort(&self) -> FlatSort {
        FlatSort::new(self.sort_by, self.order)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceColorResponse {
    pub service: String,
    pub color: String,
}
