//! Target specification types with CIDR and hostname support.
//!
//! A target is either one host (hostname or literal address) or an IPv4
//! network range in CIDR notation.

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Error type for target parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TargetError {
    #[error("empty target")]
    Empty,
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("expected a single host, got network {0}")]
    NotAHost(String),
}

/// A single host or an address range to be probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Target {
    /// A hostname or literal address.
    Host(String),
    /// An IPv4 network range.
    Network(Ipv4Network),
}

impl Target {
    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }

        if s.parse::<IpAddr>().is_ok() {
            return Ok(Self::Host(s.to_string()));
        }

        if s.contains('/') {
            let network: Ipv4Network = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            return Ok(Self::Network(network));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Host(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Parse a target that must name a single host.
    pub fn host(s: &str) -> Result<String, TargetError> {
        match Self::parse(s)? {
            Self::Host(host) => Ok(host),
            Self::Network(net) => Err(TargetError::NotAHost(net.to_string())),
        }
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(host) => write!(f, "{}", host),
            Self::Network(network) => write!(f, "{}", network),
        }
    }
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.len() > 253 {
        return false;
    }

    // A purely numeric dotted string that failed IP parsing is a bad address,
    // not a hostname.
    if s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}
