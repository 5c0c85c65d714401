//! Service color assignment
//!
//! Colors follow the first-encountered order of service names in the span
//! list. The same span order always yields the same mapping; a reordered
//! list may not.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::model::{NodeIndex, Trace};

/// Fixed palette, cycled when there are more services than entries
pub const PALETTE: [&str; 10] = [
    "#1976D2", "#388E3C", "#D32F2F", "#7B1FA2", "#FFA000", "#0097A7", "#C2185B", "#5D4037",
    "#455A64", "#F57C00",
];

/// Color for services not present in the mapping
pub const DEFAULT_COLOR: &str = "#1976D2";

/// Bar color for spans flagged as errors
pub const ERROR_COLOR: &str = "#F44336";

/// Service name to palette color
#[derive(Debug, Clone, Default)]
pub struct ServiceColors {
    order: Vec<String>,
    colors: HashMap<String, &'static str>,
}

impl ServiceColors {
    /// Color for a service, `DEFAULT_COLOR` when unknown
    pub fn color_of(&self, service_name: &str) -> &'static str {
        self.colors
            .get(service_name)
            .copied()
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Services in first-encountered order
    pub fn services(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Assign palette colors to distinct names in first-encountered order
pub fn assign_colors<'a, I>(service_names: I) -> ServiceColors
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = ServiceColors::default();
    for name in service_names {
        if result.colors.contains_key(name) {
            continue;
        }
        let color = PALETTE[result.order.len() % PALETTE.len()];
        result.colors.insert(name.to_string(), color);
        result.order.push(name.to_string());
    }
    result
}

/// Spans of one service with the color they are drawn in
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceGroup {
    pub service_name: String,
    pub color: String,
    pub span_count: usize,
    /// Sorted by relative start
    pub span_ids: Vec<String>,
}

/// Group spans by service, services in color order
pub fn service_groups(trace: &Trace) -> Vec<ServiceGroup> {
    let colors = trace.service_colors();
    let mut members: HashMap<&str, Vec<NodeIndex>> = HashMap::new();
    for (idx, node) in trace.nodes().iter().enumerate() {
        members
            .entry(node.record.service_name.as_str())
            .or_default()
            .push(idx);
    }

    colors
        .services()
        .iter()
        .map(|service| {
            let mut indices = members.remove(service.as_str()).unwrap_or_default();
            indices.sort_by_key(|&idx| trace.node(idx).relative_start.unwrap_or(0));
            ServiceGroup {
                service_name: service.clone(),
                color: colors.color_of(service).to_string(),
                span_count: indices.len(),
                span_ids: indices
                    .into_iter()
                    .map(|idx| trace.node(idx).id().to_string())
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_colors_in_encounter_order() {
        let colors = assign_colors(["api", "db", "api", "cache"]);
        assert_eq!(colors.services(), ["api", "db", "cache"]);
        assert_eq!(colors.color_of("api"), PALETTE[0]);
        assert_eq!(colors.color_of("db"), PALETTE[1]);
        assert_eq!(colors.color_of("cache"), PALETTE[2]);
    }

    #[test]
    fn test_palette_cycles() {
        let names: Vec<String> = (0..12).map(|i| format!("svc-{i}")).collect();
        let colors = assign_colors(names.iter().map(String::as_str));
        assert_eq!(colors.color_of("svc-10"), PALETTE[0]);
        assert_eq!(colors.color_of("svc-11"), PALETTE[1]);
    }

    #[test]
    fn test_unknown_service_uses_default() {
        let colors = assign_colors(["api"]);
        assert_eq!(colors.color_of("nope"), DEFAULT_COLOR);
        assert_eq!(ServiceColors::default().color_of("api"), DEFAULT_COLOR);
    }

    #[test]
    fn test_deterministic_for_same_order() {
        let input = ["c", "a", "b", "a"];
        let first = assign_colors(input);
        let second = assign_colors(input);
        for name in ["a", "b", "c"] {
            assert_eq!(first.color_of(name), second.color_of(name));
        }
    }
}
