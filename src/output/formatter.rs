//! Flattening of result values into titled text lines.
//!
//! Objects print one `Key: value` line per scalar field. Nested objects and
//! lists print a `Key:` header followed by their contents indented two
//! spaces; list elements print as `- item`, or as their own key/value lines
//! when they are objects. Field order follows the serialized order.

use crate::subnet::NOT_APPLICABLE;
use serde::Serialize;
use serde_json::{Map, Value};

const INDENT: usize = 2;

/// `"usable_host_count"` -> `"Usable Host Count"`.
pub fn title_case(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Display text of a single value.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Null => NOT_APPLICABLE.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn format_lines(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => {
            let mut lines = Vec::new();
            write_object(map, 0, &mut lines);
            lines
        }
        other => vec![scalar_text(other)],
    }
}

pub fn format_output(value: &Value) -> String {
    format_lines(value).join("\n")
}

/// Serialize `value` and flatten it.
pub fn render<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(format_output(&serde_json::to_value(value)?))
}

fn write_object(map: &Map<String, Value>, indent: usize, lines: &mut Vec<String>) {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        let label = title_case(key);
        match value {
            Value::Object(children) => {
                lines.push(format!("{}{}:", pad, label));
                write_object(children, indent + INDENT, lines);
            }
            Value::Array(items) => {
                lines.push(format!("{}{}:", pad, label));
                for item in items {
                    match item {
                        Value::Object(fields) => write_object(fields, indent + INDENT, lines),
                        other => lines.push(format!(
                            "{}{}- {}",
                            pad,
                            " ".repeat(INDENT),
                            scalar_text(other)
                        )),
                    }
                }
            }
            scalar => lines.push(format!("{}{}: {}", pad, label, scalar_text(scalar))),
        }
    }
}
