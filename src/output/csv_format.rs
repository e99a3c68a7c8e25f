//! CSV output formatting.
//!
//! Scan and discovery entries produce one row per outcome. Any other entry
//! produces `field,value` rows with nested keys joined by dots.

use crate::history::HistoryEntry;
use super::formatter::scalar_text;
use serde_json::Value;
use std::io::{self, Write};

const OUTCOME_COLUMNS: [&str; 7] = [
    "target",
    "port",
    "reachable",
    "latency_ms",
    "service_name",
    "hostname",
    "error",
];

/// Print an entry as CSV on stdout.
pub fn print_csv(entry: &HistoryEntry) -> csv::Result<()> {
    write_csv(entry, io::stdout().lock())
}

pub fn write_csv<W: Write>(entry: &HistoryEntry, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    match entry.result.get("outcomes").and_then(Value::as_array) {
        Some(outcomes) => {
            wtr.write_record(OUTCOME_COLUMNS)?;
            for outcome in outcomes {
                wtr.write_record(OUTCOME_COLUMNS.iter().map(|column| cell(outcome.get(*column))))?;
            }
        }
        None => {
            wtr.write_record(["field", "value"])?;
            let mut rows = Vec::new();
            flatten("", &entry.result, &mut rows);
            for (field, value) in rows {
                wtr.write_record([field, value])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&join(key), child, rows);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(&join(&index.to_string()), item, rows);
            }
        }
        scalar => rows.push((prefix.to_string(), scalar_text(scalar))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Operation;
    use serde_json::json;
    use std::time::Duration;

    fn csv_text(entry: &HistoryEntry) -> String {
        let mut buf = Vec::new();
        write_csv(entry, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_outcome_rows() {
        let result = json!({
            "target": "10.0.0.1",
            "outcomes": [
                { "target": "10.0.0.1", "port": 22, "reachable": true, "latency_ms": 1.5, "service_name": "ssh" },
                { "target": "10.0.0.1", "port": 23, "reachable": false, "latency_ms": null, "error": "connection" },
            ]
        });
        let entry = HistoryEntry::new(
            Operation::PortScan,
            "10.0.0.1",
            &json!({}),
            &result,
            Duration::ZERO,
            true,
        )
        .unwrap();

        let text = csv_text(&entry);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "target,port,reachable,latency_ms,service_name,hostname,error");
        assert_eq!(lines[1], "10.0.0.1,22,true,1.5,ssh,,");
        assert_eq!(lines[2], "10.0.0.1,23,false,,,,connection");
    }

    #[test]
    fn test_field_rows() {
        let result = json!({
            "host": "example.com",
            "statistics": { "received": 4, "sent": null },
            "mx_records": ["10 mail.example.com"],
        });
        let entry = HistoryEntry::new(
            Operation::Lookup,
            "example.com",
            &json!({}),
            &result,
            Duration::ZERO,
            true,
        )
        .unwrap();

        let text = csv_text(&entry);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "field,value",
                "host,example.com",
                "statistics.received,4",
                "statistics.sent,N/A",
                "mx_records.0,10 mail.example.com",
            ]
        );
    }
}
