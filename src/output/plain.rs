//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use super::formatter::format_lines;
use crate::history::HistoryEntry;
use console::style;
use serde_json::Value;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Print an entry in human-readable plain text format.
pub fn print_plain(entry: &HistoryEntry) -> io::Result<()> {
    let mut out = io::stdout().lock();

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(
        out,
        "  {} {}",
        style(entry.operation).cyan().bold(),
        style(&entry.target).white().bold()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    for line in format_lines(&plain_view(&entry.result)) {
        writeln!(out, "  {}", line)?;
    }

    writeln!(out)?;
    let status = if entry.success {
        style("completed").green().bold()
    } else {
        style("failed").red().bold()
    };
    writeln!(
        out,
        "  {} in {:.2}s  {}",
        status,
        entry.duration_ms as f64 / 1000.0,
        style(entry.id.short()).dim()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Drop raw tool output and unreachable outcomes; the parsed fields and
/// counts already summarize them.
fn plain_view(result: &Value) -> Value {
    let mut view = result.clone();
    if let Value::Object(map) = &mut view {
        map.remove("output");
    }
    if let Some(Value::Array(outcomes)) = view.get_mut("outcomes") {
        outcomes.retain(|o| o.get("reachable").and_then(Value::as_bool) == Some(true));
    }
    view
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
