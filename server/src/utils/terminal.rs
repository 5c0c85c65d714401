//! Terminal output helpers

use supports_hyperlinks::Stream;

const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Cyan URL, wrapped in an OSC 8 hyperlink when stdout supports it
pub fn terminal_link(url: &str) -> String {
    format_link(url, supports_hyperlinks::on(Stream::Stdout))
}

fn format_link(url: &str, hyperlink: bool) -> String {
    if hyperlink {
        format!("\x1b]8;;{url}\x07{CYAN}{url}{RESET}\x1b]8;;\x07")
    } else {
        format!("{CYAN}{url}{RESET}")
    }
}
