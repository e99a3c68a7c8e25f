//! Hop-by-hop route tracing through the system traceroute.

use super::tool::ProbeTool;
use crate::error::{ProbeError, ProbeResult};
use crate::types::Target;
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for a whole trace when the caller does not choose one.
pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(60);

/// One numbered line of traceroute output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hop {
    pub hop: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_ms: Option<f64>,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceReport {
    pub host: String,
    pub max_hops: u8,
    pub success: bool,
    pub hops: Vec<Hop>,
    pub output: String,
}

/// Pick the hop lines out of traceroute or tracert output.
pub fn parse_hops(output: &str) -> Vec<Hop> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let hop = line.split_whitespace().next()?.parse::<u32>().ok()?;
            Some(Hop {
                hop,
                rtt_ms: parse_hop_rtt(line),
                line: line.to_string(),
            })
        })
        .collect()
}

/// First round-trip time on a hop line: `0.512 ms`, `<1 ms` or `12ms`.
fn parse_hop_rtt(line: &str) -> Option<f64> {
    let tokens: Vec<&str> = line.split_whitespace().skip(1).collect();
    tokens.iter().enumerate().find_map(|(i, token)| {
        let value = if token.eq_ignore_ascii_case("ms") {
            *tokens.get(i.checked_sub(1)?)?
        } else {
            token.strip_suffix("ms")?
        };
        value.trim_start_matches('<').parse::<f64>().ok()
    })
}

/// Trace the route to `host`, giving up after `timeout`.
pub async fn trace_route(
    tool: &dyn ProbeTool,
    host: &str,
    max_hops: u8,
    timeout: Duration,
) -> ProbeResult<TraceReport> {
    let host = Target::host(host)?;
    if max_hops == 0 {
        return Err(ProbeError::InvalidInput(
            "max hops must be at least 1".to_string(),
        ));
    }

    let mut command = tool.trace_command(&host, max_hops);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    info!(target_host = %host, max_hops, "tracing route");
    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| ProbeError::timeout(timeout))?
        .map_err(|e| ProbeError::ExternalTool(format!("failed to run traceroute: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let hops = parse_hops(&stdout);
    debug!(target_host = %host, hops = hops.len(), status = %output.status, "trace finished");

    if !output.status.success() && hops.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::ExternalTool(format!(
            "traceroute exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(TraceReport {
        host,
        max_hops,
        success: output.status.success(),
        hops,
        output: stdout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIX_TRACE: &str = "traceroute to example.com (93.184.216.34), 30 hops max, 60 byte packets
 1  gateway (192.168.1.1)  0.512 ms  0.401 ms  0.388 ms
 2  * * *
 3  10.20.0.1 (10.20.0.1)  8.913 ms  9.002 ms  9.120 ms";

    const WINDOWS_TRACE: &str = "Tracing route to example.com [93.184.216.34]
over a maximum of 30 hops:

  1    <1 ms    <1 ms    <1 ms  192.168.1.1
  2    12ms     11ms     13ms   10.0.0.1

Trace complete.";

    #[test]
    fn test_parse_unix_hops() {
        let hops = parse_hops(UNIX_TRACE);
        assert_eq!(hops.len(), 3);
        assert_eq!(hops[0].hop, 1);
        assert_eq!(hops[0].rtt_ms, Some(0.512));
        assert_eq!(hops[1].rtt_ms, None);
        assert_eq!(hops[2].rtt_ms, Some(8.913));
        assert!(hops[2].line.starts_with("3  10.20.0.1"));
    }

    #[test]
    fn test_parse_windows_hops() {
        let hops = parse_hops(WINDOWS_TRACE);
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[0].rtt_ms, Some(1.0));
        assert_eq!(hops[1].hop, 2);
        assert_eq!(hops[1].rtt_ms, Some(12.0));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::error::ErrorKind;
        use crate::probe::tool::PingMode;
        use tokio::process::Command;
        use tokio_test::{assert_err, assert_ok};

        #[derive(Debug)]
        struct ScriptTool(String);

        impl ProbeTool for ScriptTool {
            fn ping_command(&self, _target: &str, _mode: PingMode, _timeout: Duration) -> Command {
                Command::new("true")
            }

            fn trace_command(&self, _target: &str, _max_hops: u8) -> Command {
                let mut command = Command::new("sh");
                command.arg("-c").arg(&self.0);
                command
            }
        }

        #[tokio::test]
        async fn test_trace_route_collects_hops() {
            let tool = ScriptTool(format!("printf '%s\\n' '{}'", UNIX_TRACE.replace('\n', "' '")));
            let report = assert_ok!(trace_route(&tool, "example.com", 30, Duration::from_secs(5)).await);
            assert!(report.success);
            assert_eq!(report.hops.len(), 3);
            assert_eq!(report.max_hops, 30);
        }

        #[tokio::test]
        async fn test_trace_route_failure_without_hops() {
            let tool = ScriptTool("echo 'unknown host' >&2; exit 2".to_string());
            let err = trace_route(&tool, "example.com", 30, Duration::from_secs(5))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ExternalTool);
            assert!(err.to_string().contains("unknown host"));
        }

        #[tokio::test]
        async fn test_trace_route_timeout() {
            let tool = ScriptTool("sleep 5".to_string());
            let err = trace_route(&tool, "example.com", 30, Duration::from_millis(50))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Timeout);
        }

        #[tokio::test]
        async fn test_trace_route_rejects_bad_input() {
            let tool = ScriptTool("true".to_string());
            let err = assert_err!(trace_route(&tool, "10.0.0.0/24", 30, Duration::from_secs(1)).await);
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            let err = assert_err!(trace_route(&tool, "example.com", 0, Duration::from_secs(1)).await);
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }
}
