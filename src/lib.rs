//! # NetPulse - Concurrent Network Probing
//!
//! NetPulse drives the everyday network diagnostics from one async engine:
//! streaming ping, route tracing, DNS lookups, subnet calculation, TCP port
//! scanning, host discovery and link quality estimation.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netpulse::scanner::{ConcurrentScanner, JobConfig};
//!
//! #[tokio::main]
//! async fn main() -> netpulse::ProbeResult<()> {
//!     let scanner = ConcurrentScanner::new(JobConfig::default())?;
//!     let result = scanner
//!         .scan_ports("192.168.1.1", "22,80,443", |open| {
//!             println!("{:?} is open", open.port);
//!         })
//!         .await?;
//!     println!("{} of {} ports open", result.succeeded, result.attempted);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`probe`] - Ping sessions, route tracing, name resolution and interfaces
//! - [`scanner`] - Worker pool for port scans and host discovery
//! - [`bandwidth`] - Link quality from latency samples
//! - [`subnet`] - IPv4 subnet calculator
//! - [`output`] - Plain, JSON and CSV rendering
//! - [`history`] - Records of completed operations
//! - [`config`] - Application settings
//! - [`types`] - Targets, ports and identifiers
//! - [`error`] - Error types

pub mod bandwidth;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod output;
pub mod probe;
pub mod scanner;
pub mod services;
pub mod subnet;
pub mod types;

pub use bandwidth::{BandwidthEstimator, BandwidthReport, LinkQuality, QualityTier};
pub use error::{CliError, ErrorKind, ProbeError, ProbeResult};
pub use history::{HistoryEntry, Operation};
pub use probe::{PingReport, PingRequest, PingSession, ProbeController};
pub use scanner::{ConcurrentScanner, JobConfig, ProbeOutcome, ScanResult};
pub use subnet::NetworkInfo;
pub use types::{JobId, Port, PortSpec, Target};
