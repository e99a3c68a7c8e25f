//! Output formatting module.
//!
//! Renders history entries as plain text, JSON, or CSV.

mod csv_format;
mod formatter;
mod json_format;
mod plain;

pub use csv_format::{print_csv, write_csv};
pub use formatter::{format_lines, format_output, render, scalar_text, title_case};
pub use json_format::print_json;
pub use plain::{print_error, print_plain, print_warning};

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::history::HistoryEntry;

/// Print an entry in the requested format.
pub fn print_entry(entry: &HistoryEntry, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Plain => plain::print_plain(entry)?,
        OutputFormat::Json => json_format::print_json(entry)?,
        OutputFormat::Csv => csv_format::print_csv(entry)?,
    }
    Ok(())
}
