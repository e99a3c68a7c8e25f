//! Error types for NetPulse.
//!
//! Uses `thiserror` for ergonomic error definitions. `ProbeError` is the
//! engine taxonomy; the remaining types belong to configuration and the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for probing and scanning operations.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeError {
    /// Malformed target, CIDR, port spec or job configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external probe tool failed to spawn or exited abnormally.
    #[error("external tool failed: {0}")]
    ExternalTool(String),

    /// Per-target socket failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A probe exceeded its timeout.
    #[error("probe timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Bandwidth estimation collected no successful sample.
    #[error("no successful samples collected from {0}")]
    NoSamples(String),
}

impl ProbeError {
    /// Build a timeout error from the elapsed budget.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout {
            after_ms: after.as_millis() as u64,
        }
    }

    /// The coarse kind recorded in per-target outcomes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ExternalTool(_) => ErrorKind::ExternalTool,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NoSamples(_) => ErrorKind::NoSamples,
        }
    }
}

/// Error kind without payload, stored on each `ProbeOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    ExternalTool,
    Connection,
    Timeout,
    NoSamples,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidInput => "invalid input",
            Self::ExternalTool => "external tool",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::NoSamples => "no samples",
        };
        f.write_str(name)
    }
}

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

impl From<crate::types::PortError> for ProbeError {
    fn from(e: crate::types::PortError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<crate::types::TargetError> for ProbeError {
    fn from(e: crate::types::TargetError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

/// Errors raised while loading or saving settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by CLI command handlers.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI handlers.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ProbeError::InvalidInput("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ProbeError::timeout(Duration::from_millis(250)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            ProbeError::NoSamples("8.8.8.8".into()).kind(),
            ErrorKind::NoSamples
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = ProbeError::timeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "probe timed out after 2000ms");
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(ProbeError::ExternalTool("boom".into())).unwrap();
        assert_eq!(json["kind"], "external_tool");
        assert_eq!(json["detail"], "boom");
    }
}
