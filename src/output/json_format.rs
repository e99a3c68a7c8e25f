//! JSON output formatting.

use crate::history::HistoryEntry;
use std::io::{self, Write};

/// Print the whole entry as pretty JSON.
pub fn print_json(entry: &HistoryEntry) -> io::Result<()> {
    let json = serde_json::to_string_pretty(entry).map_err(io::Error::other)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{}", json)
}
