//! Local network interfaces.
//!
//! A snapshot of what the datalink layer reports: name, hardware address,
//! state flags and every assigned address with its netmask and broadcast.

use ipnetwork::IpNetwork;
use pnet::datalink::{self, NetworkInterface};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

/// One address assigned to an interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceAddress {
    pub family: AddressFamily,
    pub address: IpAddr,
    pub prefix: u8,
    pub netmask: IpAddr,
    /// IPv4 only, and only for networks with a host range.
    pub broadcast: Option<Ipv4Addr>,
}

impl From<&IpNetwork> for InterfaceAddress {
    fn from(network: &IpNetwork) -> Self {
        let (family, broadcast) = match network {
            IpNetwork::V4(v4) if v4.prefix() < 31 => (AddressFamily::Ipv4, Some(v4.broadcast())),
            IpNetwork::V4(_) => (AddressFamily::Ipv4, None),
            IpNetwork::V6(_) => (AddressFamily::Ipv6, None),
        };
        Self {
            family,
            address: network.ip(),
            prefix: network.prefix(),
            netmask: network.mask(),
            broadcast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub index: u32,
    pub mac_address: Option<String>,
    pub is_up: bool,
    pub is_loopback: bool,
    pub is_multicast: bool,
    pub addresses: Vec<InterfaceAddress>,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(interface: &NetworkInterface) -> Self {
        Self {
            name: interface.name.clone(),
            index: interface.index,
            mac_address: interface.mac.map(|mac| mac.to_string()),
            is_up: interface.is_up(),
            is_loopback: interface.is_loopback(),
            is_multicast: interface.is_multicast(),
            addresses: interface.ips.iter().map(InterfaceAddress::from).collect(),
        }
    }
}

impl InterfaceInfo {
    pub fn ipv4_addresses(&self) -> impl Iterator<Item = &InterfaceAddress> {
        self.addresses
            .iter()
            .filter(|a| a.family == AddressFamily::Ipv4)
    }
}

/// Every interface on this machine, ordered by index.
pub fn list_interfaces() -> Vec<InterfaceInfo> {
    let mut interfaces: Vec<InterfaceInfo> = datalink::interfaces()
        .iter()
        .map(InterfaceInfo::from)
        .collect();
    interfaces.sort_by_key(|i| i.index);
    debug!(count = interfaces.len(), "listed network interfaces");
    interfaces
}
