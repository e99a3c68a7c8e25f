//! Records describing one completed operation.
//!
//! Entries are built here and handed to whoever wants to keep them; the
//! engine itself never writes them anywhere.

use crate::types::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Ping,
    Trace,
    Lookup,
    Subnet,
    PortScan,
    Discovery,
    Bandwidth,
    Interfaces,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ping => "Ping",
            Self::Trace => "Traceroute",
            Self::Lookup => "DNS Lookup",
            Self::Subnet => "Subnet Calculator",
            Self::PortScan => "Port Scan",
            Self::Discovery => "Host Discovery",
            Self::Bandwidth => "Bandwidth Test",
            Self::Interfaces => "Network Interfaces",
        };
        f.write_str(name)
    }
}

/// One operation, its inputs and its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: JobId,
    pub recorded_at: DateTime<Utc>,
    pub operation: Operation,
    pub target: String,
    pub parameters: Value,
    pub result: Value,
    pub duration_ms: u64,
    pub success: bool,
}

impl HistoryEntry {
    pub fn new<P, R>(
        operation: Operation,
        target: impl Into<String>,
        parameters: &P,
        result: &R,
        elapsed: Duration,
        success: bool,
    ) -> serde_json::Result<Self>
    where
        P: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        Ok(Self {
            id: JobId::new(),
            recorded_at: Utc::now(),
            operation,
            target: target.into(),
            parameters: serde_json::to_value(parameters)?,
            result: serde_json::to_value(result)?,
            duration_ms: elapsed.as_millis() as u64,
            success,
        })
    }

    /// Keep the id of the job that produced the result.
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_captures_values() {
        let entry = HistoryEntry::new(
            Operation::Subnet,
            "10.0.0.0/24",
            &json!({ "input": "10.0.0.0/24" }),
            &json!({ "usable_host_count": 254 }),
            Duration::from_millis(3),
            true,
        )
        .unwrap();

        assert_eq!(entry.operation, Operation::Subnet);
        assert_eq!(entry.result["usable_host_count"], 254);
        assert_eq!(entry.duration_ms, 3);
        assert!(entry.success);
    }

    #[test]
    fn test_entry_round_trips_through_json() {
        let entry = HistoryEntry::new(
            Operation::PortScan,
            "127.0.0.1",
            &json!({ "ports": "1-100" }),
            &json!({ "succeeded": 1 }),
            Duration::from_secs(2),
            true,
        )
        .unwrap();
        let text = serde_json::to_string(&entry).unwrap();
        assert!(text.contains("\"operation\":\"port_scan\""));
        let parsed: HistoryEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::PortScan.to_string(), "Port Scan");
        assert_eq!(Operation::Trace.to_string(), "Traceroute");
        assert_eq!(
            serde_json::to_value(Operation::Interfaces).unwrap(),
            json!("interfaces")
        );
    }
}
