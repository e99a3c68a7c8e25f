//! TCP connect probing.
//!
//! Completes the full handshake through the OS socket API, so no elevated
//! privileges are needed.

use super::traits::{ProbeOutcome, Prober};
use crate::error::{ErrorKind, ProbeError};
use crate::services::service_or_unknown;
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Probes ports of one address with a TCP connect.
#[derive(Debug, Clone)]
pub struct TcpProber {
    target: IpAddr,
    timeout: Duration,
}

impl TcpProber {
    pub fn new(target: IpAddr, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    pub fn target(&self) -> IpAddr {
        self.target
    }

    fn classify(&self, e: io::Error) -> ProbeError {
        match e.kind() {
            io::ErrorKind::TimedOut => ProbeError::timeout(self.timeout),
            _ => ProbeError::Connection(e.to_string()),
        }
    }
}

#[async_trait]
impl Prober<u16> for TcpProber {
    async fn probe(&self, port: u16) -> ProbeOutcome {
        let addr = SocketAddr::new(self.target, port);
        let target = self.target.to_string();
        let start = Instant::now();

        match timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                let latency = start.elapsed().as_secs_f64() * 1000.0;
                drop(stream);
                debug!(%addr, latency_ms = latency, "port open");
                ProbeOutcome::reachable(target)
                    .with_port(port)
                    .with_latency(Some(latency))
                    .with_service(service_or_unknown(port))
            }
            Ok(Err(e)) => {
                let error = self.classify(e);
                debug!(%addr, %error, "port closed");
                ProbeOutcome::unreachable(target, error.kind()).with_port(port)
            }
            Err(_) => {
                debug!(%addr, "port filtered");
                ProbeOutcome::unreachable(target, ErrorKind::Timeout).with_port(port)
            }
        }
    }
}
