//! Host discovery by echo request.

use super::traits::{ProbeOutcome, Prober};
use crate::error::ErrorKind;
use crate::probe::{echo_once, HostResolver, ProbeTool};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Hostname recorded when a responder has no reverse name.
pub const UNKNOWN_HOST: &str = "unknown";

/// Sends one echo per address and names the responders.
#[derive(Debug, Clone)]
pub struct HostProber {
    tool: Arc<dyn ProbeTool>,
    resolver: Option<Arc<dyn HostResolver>>,
    timeout: Duration,
}

impl HostProber {
    pub fn new(tool: Arc<dyn ProbeTool>, resolver: Arc<dyn HostResolver>, timeout: Duration) -> Self {
        Self {
            tool,
            resolver: Some(resolver),
            timeout,
        }
    }

    /// Skip reverse lookups; responders carry no hostname.
    pub fn without_names(mut self) -> Self {
        self.resolver = None;
        self
    }
}

#[async_trait]
impl Prober<Ipv4Addr> for HostProber {
    async fn probe(&self, ip: Ipv4Addr) -> ProbeOutcome {
        let target = ip.to_string();
        match echo_once(self.tool.as_ref(), &target, self.timeout).await {
            Ok(reply) if reply.reachable => {
                let outcome = ProbeOutcome::reachable(target).with_latency(reply.rtt_ms);
                match &self.resolver {
                    Some(resolver) => {
                        let name = resolver.reverse(IpAddr::V4(ip)).await;
                        outcome.with_hostname(name.as_deref().unwrap_or(UNKNOWN_HOST))
                    }
                    None => outcome,
                }
            }
            Ok(_) => ProbeOutcome::unreachable(target, ErrorKind::Timeout),
            Err(e) => {
                debug!(host = %ip, error = %e, "echo failed");
                ProbeOutcome::unreachable(target, e.kind())
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::probe::{NameResolver, PingMode};
    use tokio::process::Command;

    /// Answers only for addresses ending in `.7`.
    #[derive(Debug)]
    struct SelectiveTool;

    impl ProbeTool for SelectiveTool {
        fn ping_command(&self, target: &str, _mode: PingMode, _timeout: Duration) -> Command {
            let script = if target.ends_with(".7") {
                format!("echo '64 bytes from {}: icmp_seq=1 ttl=64 time=0.8 ms'", target)
            } else {
                "exit 1".to_string()
            };
            let mut command = Command::new("sh");
            command.arg("-c").arg(script);
            command
        }

        fn trace_command(&self, _target: &str, _max_hops: u8) -> Command {
            Command::new("true")
        }
    }

    #[tokio::test]
    async fn test_responder_is_reachable() {
        let prober = HostProber::new(
            Arc::new(SelectiveTool),
            Arc::new(NameResolver::new(Duration::from_millis(100))),
            Duration::from_secs(1),
        )
        .without_names();

        let outcome = prober.probe(Ipv4Addr::new(10, 0, 0, 7)).await;
        assert!(outcome.reachable);
        assert_eq!(outcome.latency_ms, Some(0.8));
        assert_eq!(outcome.hostname, None);

        let outcome = prober.probe(Ipv4Addr::new(10, 0, 0, 8)).await;
        assert!(!outcome.reachable);
        assert_eq!(outcome.error, Some(ErrorKind::Timeout));
    }
}
