//! IPv4 subnet calculation.
//!
//! Pure functions over `ipnetwork`: no I/O, no shared state. Accepted input
//! forms are `a.b.c.d/n`, `a.b.c.d/m.m.m.m`, `a.b.c.d m.m.m.m` and a bare
//! `a.b.c.d`, which is placed in its classful natural network.
//!
//! Slash forms describe a network, so the reported address (and the class
//! and flags derived from it) is the network address. The other forms keep
//! the address as typed.

use crate::error::{ProbeError, ProbeResult};
use ipnetwork::{ipv4_mask_to_prefix, Ipv4Network};
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;

/// Text shown in place of a usable address for /31 and /32 networks.
pub const NOT_APPLICABLE: &str = "N/A";

/// Blocks not routable on the public internet: RFC 1918, loopback,
/// link-local, "this network", IETF protocol assignments, documentation,
/// benchmarking and the reserved 240/4.
const PRIVATE_BLOCKS: [(Ipv4Addr, u8); 11] = [
    (Ipv4Addr::new(0, 0, 0, 0), 8),
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 0, 0, 0), 24),
    (Ipv4Addr::new(192, 0, 2, 0), 24),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(198, 18, 0, 0), 15),
    (Ipv4Addr::new(198, 51, 100, 0), 24),
    (Ipv4Addr::new(203, 0, 113, 0), 24),
];

/// Whether `ip` lies in a non-public block.
pub fn is_private(ip: Ipv4Addr) -> bool {
    is_reserved(ip)
        || PRIVATE_BLOCKS.iter().any(|&(base, prefix)| {
            let shift = 32 - u32::from(prefix);
            u32::from(ip) >> shift == u32::from(base) >> shift
        })
}

/// 240.0.0.0/4, including the limited broadcast address.
pub fn is_reserved(ip: Ipv4Addr) -> bool {
    ip.octets()[0] >= 240
}

/// Classful address category of the first octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IpClass {
    A,
    B,
    C,
    #[serde(rename = "D (Multicast)")]
    D,
    #[serde(rename = "E (Experimental)")]
    E,
    Unknown,
}

impl IpClass {
    /// Class of an address by its first octet. 0 and 127 are not classful.
    pub fn of(ip: Ipv4Addr) -> Self {
        match ip.octets()[0] {
            1..=126 => Self::A,
            128..=191 => Self::B,
            192..=223 => Self::C,
            224..=239 => Self::D,
            240..=255 => Self::E,
            _ => Self::Unknown,
        }
    }

    /// Prefix length of the natural network for this class.
    fn natural_prefix(self) -> u8 {
        match self {
            Self::A | Self::Unknown => 8,
            Self::B => 16,
            Self::C => 24,
            Self::D | Self::E => 32,
        }
    }
}

impl fmt::Display for IpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D (Multicast)",
            Self::E => "E (Experimental)",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Everything derived from one subnet input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInfo {
    pub ip_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub wildcard_mask: Ipv4Addr,
    pub cidr_notation: String,
    pub network_address: Ipv4Addr,
    pub broadcast_address: Ipv4Addr,
    #[serde(serialize_with = "usable_or_na")]
    pub first_usable: Option<Ipv4Addr>,
    #[serde(serialize_with = "usable_or_na")]
    pub last_usable: Option<Ipv4Addr>,
    pub usable_host_count: u64,
    pub total_addresses: u64,
    pub ip_class: IpClass,
    pub is_private: bool,
    pub is_multicast: bool,
    pub is_reserved: bool,
    #[serde(skip)]
    network: Ipv4Network,
}

fn usable_or_na<S: Serializer>(value: &Option<Ipv4Addr>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(ip) => serializer.collect_str(ip),
        None => serializer.serialize_str(NOT_APPLICABLE),
    }
}

impl NetworkInfo {
    fn new(ip: Ipv4Addr, network: Ipv4Network) -> Self {
        let prefix = network.prefix();
        let network_address = network.network();
        let broadcast_address = network.broadcast();
        let subnet_mask = network.mask();
        let total_addresses = 1u64 << (32 - u32::from(prefix));

        let (first_usable, last_usable, usable_host_count) = if prefix >= 31 {
            (None, None, 0)
        } else {
            (
                Some(Ipv4Addr::from(u32::from(network_address) + 1)),
                Some(Ipv4Addr::from(u32::from(broadcast_address) - 1)),
                total_addresses - 2,
            )
        };

        Self {
            ip_address: ip,
            subnet_mask,
            wildcard_mask: Ipv4Addr::from(!u32::from(subnet_mask)),
            cidr_notation: format!("{}/{}", network_address, prefix),
            network_address,
            broadcast_address,
            first_usable,
            last_usable,
            usable_host_count,
            total_addresses,
            ip_class: IpClass::of(ip),
            is_private: is_private(ip),
            is_multicast: ip.is_multicast(),
            is_reserved: is_reserved(ip),
            network,
        }
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Display text of the first usable host, `"N/A"` when there is none.
    pub fn first_usable_display(&self) -> String {
        self.first_usable
            .map_or_else(|| NOT_APPLICABLE.to_string(), |ip| ip.to_string())
    }

    /// Display text of the last usable host, `"N/A"` when there is none.
    pub fn last_usable_display(&self) -> String {
        self.last_usable
            .map_or_else(|| NOT_APPLICABLE.to_string(), |ip| ip.to_string())
    }

    /// Iterate the usable host addresses in ascending order.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        let range = match (self.first_usable, self.last_usable) {
            (Some(first), Some(last)) => u32::from(first)..=u32::from(last),
            _ => 1..=0,
        };
        range.map(Ipv4Addr::from)
    }
}

/// Parse a subnet description into its derived facts.
pub fn parse(input: &str) -> ProbeResult<NetworkInfo> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ProbeError::InvalidInput("empty subnet input".to_string()));
    }

    let (ip, prefix, as_network) = match input.split_once('/') {
        Some((addr, suffix)) => (parse_addr(addr)?, parse_prefix(suffix)?, true),
        None => {
            let parts: Vec<&str> = input.split_whitespace().collect();
            match parts.as_slice() {
                [addr] => {
                    let ip = parse_addr(addr)?;
                    (ip, IpClass::of(ip).natural_prefix(), false)
                }
                [addr, mask] => (parse_addr(addr)?, parse_prefix(mask)?, false),
                _ => {
                    return Err(ProbeError::InvalidInput(format!(
                        "expected 'address/prefix' or 'address mask', got '{}'",
                        input
                    )))
                }
            }
        }
    };

    let network = Ipv4Network::new(ip, prefix)
        .map_err(|e| ProbeError::InvalidInput(format!("{}: {}", input, e)))?;
    let ip = if as_network { network.network() } else { ip };
    Ok(NetworkInfo::new(ip, network))
}

fn parse_addr(raw: &str) -> ProbeResult<Ipv4Addr> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| ProbeError::InvalidInput(format!("invalid IPv4 address '{}'", raw)))
}

/// A prefix length or a dotted-decimal mask.
fn parse_prefix(raw: &str) -> ProbeResult<u8> {
    let raw = raw.trim();
    if raw.contains('.') {
        let mask = parse_addr(raw)?;
        return ipv4_mask_to_prefix(mask)
            .map_err(|_| ProbeError::InvalidInput(format!("non-contiguous subnet mask '{}'", raw)));
    }

    match raw.parse::<u8>() {
        Ok(prefix) if prefix <= 32 => Ok(prefix),
        _ => Err(ProbeError::InvalidInput(format!(
            "invalid prefix length '{}'",
            raw
        ))),
    }
}
