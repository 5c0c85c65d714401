//! Terminal rendering for `tracelens show`

use std::fmt::Write;

use crate::domain::traces::{RowView, SpanRecord, TimeMarker, TraceSummary};
use crate::utils::time::{format_duration_micros, format_timestamp_micros};

/// Columns used for the bar area of the waterfall
const BAR_WIDTH: usize = 60;

/// Columns used for the span label in the waterfall
const LABEL_WIDTH: usize = 44;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";

/// 24-bit ANSI foreground for a `#RRGGBB` token, empty if malformed
fn ansi_color(hex: &str) -> String {
    let Some(digits) = hex.strip_prefix('#').filter(|d| d.len() == 6) else {
        return String::new();
    };
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => format!("\x1b[38;2;{r};{g};{b}m"),
        _ => String::new(),
    }
}

fn toggle_glyph(row: &RowView) -> &'static str {
    match (row.has_children, row.collapsed) {
        (false, _) => " ",
        (true, true) => "▶",
        (true, false) => "▼",
    }
}

/// Truncate to `width` characters, padding with spaces
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    } else {
        format!("{text}{}", " ".repeat(width - count))
    }
}

pub fn render_summary(summary: &TraceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{BOLD}Trace {}{RESET}  {DIM}started {} UTC{RESET}",
        summary.trace_id.as_deref().unwrap_or("-"),
        summary.start_time
    );
    let _ = writeln!(
        out,
        "{DIM}{} spans · {} services · {} roots · {} errors · {}{RESET}",
        summary.span_count,
        summary.service_count,
        summary.root_count,
        summary.error_count,
        summary.total_duration
    );
    out
}

/// Waterfall view: label column plus a proportional bar per row
pub fn render_timeline(rows: &[RowView], markers: &[TimeMarker]) -> String {
    let mut out = String::new();

    let mut axis = vec![' '; BAR_WIDTH + 8];
    for marker in markers {
        let col = ((marker.position_percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        for (offset, ch) in marker.label.chars().enumerate() {
            if let Some(slot) = axis.get_mut(col + offset) {
                *slot = ch;
            }
        }
    }
    let axis: String = axis.into_iter().collect();
    let _ = writeln!(out, "{}{DIM}{}{RESET}", " ".repeat(LABEL_WIDTH + 1), axis.trim_end());

    for row in rows {
        let label = format!(
            "{}{} {} [{}]",
            "  ".repeat(row.depth),
            toggle_glyph(row),
            row.operation_name,
            row.service_name
        );
        let label = fit(&label, LABEL_WIDTH);

        let start = ((row.layout.left_percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        let start = start.min(BAR_WIDTH.saturating_sub(1));
        let len = ((row.layout.width_percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        let len = len.clamp(1, BAR_WIDTH - start);

        let _ = writeln!(
            out,
            "{label} {}{}{}{RESET} {DIM}{}{RESET}",
            " ".repeat(start),
            ansi_color(&row.bar_color),
            "█".repeat(len),
            row.duration
        );
    }
    out
}

/// Indented span tree
pub fn render_hierarchy(rows: &[RowView]) -> String {
    let mut out = String::new();
    for row in rows {
        let error = if row.is_error { " \x1b[31m✖ error\x1b[0m" } else { "" };
        let _ = writeln!(
            out,
            "{}{} {}{}{RESET} {} {DIM}{} · {}{RESET}{}",
            "  ".repeat(row.depth),
            toggle_glyph(row),
            ansi_color(&row.color),
            row.service_name,
            row.operation_name,
            row.duration,
            row.span_id,
            error
        );
    }
    out
}

/// Flat span table
pub fn render_spans(records: &[SpanRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{BOLD}{:<12}  {:>10}  {:<20}  {:<30}  {}{RESET}",
        "START", "DURATION", "SERVICE", "OPERATION", "SPAN"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:<12}  {:>10}  {}  {}  {}{}",
            format_timestamp_micros(record.start_timestamp),
            format_duration_micros(record.duration_micros),
            fit(&record.service_name, 20),
            fit(&record.operation_name, 30),
            record.id,
            if record.is_error { " \x1b[31m✖\x1b[0m" } else { "" }
        );
    }
    out
}
