//! Prober abstraction.
//!
//! A prober checks one target and always produces an outcome; errors are
//! recorded on the outcome rather than returned, so one bad target never
//! aborts a batch.

use crate::error::ErrorKind;
use async_trait::async_trait;
use serde::Serialize;

/// Result of probing one target (and port, for port scans).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub reachable: bool,
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ProbeOutcome {
    /// A target that answered.
    pub fn reachable(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            port: None,
            reachable: true,
            latency_ms: None,
            service_name: None,
            hostname: None,
            error: None,
        }
    }

    /// A target that did not answer, and why.
    pub fn unreachable(target: impl Into<String>, error: ErrorKind) -> Self {
        Self {
            reachable: false,
            error: Some(error),
            ..Self::reachable(target)
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_latency(mut self, latency_ms: Option<f64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service_name = Some(service.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }
}

/// Checks a single target of type `T`.
///
/// # Example
///
/// ```ignore
/// use netpulse::scanner::{ProbeOutcome, Prober};
///
/// async fn check<P: Prober<u16>>(prober: &P, port: u16) -> bool {
///     prober.probe(port).await.reachable
/// }
/// ```
#[async_trait]
pub trait Prober<T: Send + 'static>: Send + Sync {
    async fn probe(&self, target: T) -> ProbeOutcome;
}
