//! Host network identity for ArtNet discovery

use std::net::Ipv4Addr;

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;

use crate::error::{IoError, Result};

/// Address, MAC and broadcast of the interface used for ArtNet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Interface name
    pub interface: String,
    /// IPv4 address
    pub ip: Ipv4Addr,
    /// Hardware address (zero if unknown)
    pub mac: [u8; 6],
    /// Subnet broadcast address
    pub broadcast: Ipv4Addr,
}

impl HostInfo {
    /// Identity used when no interface is up
    pub fn unspecified() -> Self {
        Self {
            interface: String::new(),
            ip: Ipv4Addr::UNSPECIFIED,
            mac: [0; 6],
            broadcast: Ipv4Addr::BROADCAST,
        }
    }

    /// Inspect the host's interfaces
    pub fn discover() -> Result<Self> {
        let mut entries: Vec<IfaceEntry> = Vec::new();
        for ifaddr in getifaddrs()? {
            let entry = match entries.iter_mut().find(|e| e.name == ifaddr.interface_name) {
                Some(entry) => entry,
                None => {
                    entries.push(IfaceEntry {
                        name: ifaddr.interface_name.clone(),
                        ..Default::default()
                    });
                    let last = entries.len() - 1;
                    &mut entries[last]
                }
            };
            entry.up |= ifaddr.flags.contains(InterfaceFlags::IFF_UP);
            entry.loopback |= ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK);

            let Some(address) = ifaddr.address else {
                continue;
            };
            if let Some(link) = address.as_link_addr() {
                if let Some(mac) = link.addr() {
                    entry.mac = Some(mac);
                }
            }
            if let Some(inet) = address.as_sockaddr_in() {
                entry.ip = Some(inet.ip());
                entry.netmask = ifaddr
                    .netmask
                    .as_ref()
                    .and_then(|m| m.as_sockaddr_in())
                    .map(|m| m.ip());
                entry.broadcast = ifaddr
                    .broadcast
                    .as_ref()
                    .and_then(|b| b.as_sockaddr_in())
                    .map(|b| b.ip());
            }
        }

        let host = select_host(&entries).ok_or(IoError::NoInterface)?;
        tracing::info!(
            "Using interface {} ({}, broadcast {})",
            host.interface,
            host.ip,
            host.broadcast
        );
        Ok(host)
    }
}

/// Everything known about one interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IfaceEntry {
    /// Interface name
    pub name: String,
    /// IFF_UP set
    pub up: bool,
    /// IFF_LOOPBACK set
    pub loopback: bool,
    /// IPv4 address
    pub ip: Option<Ipv4Addr>,
    /// IPv4 netmask
    pub netmask: Option<Ipv4Addr>,
    /// IPv4 broadcast
    pub broadcast: Option<Ipv4Addr>,
    /// Hardware address
    pub mac: Option<[u8; 6]>,
}

/// Pick the first interface that is up, not loopback and has an IPv4 address
pub fn select_host(entries: &[IfaceEntry]) -> Option<HostInfo> {
    entries
        .iter()
        .filter(|e| e.up && !e.loopback)
        .find_map(|e| {
            let ip = e.ip?;
            let broadcast = e.broadcast.unwrap_or_else(|| match e.netmask {
                Some(mask) => Ipv4Addr::from(u32::from(ip) | !u32::from(mask)),
                None => Ipv4Addr::BROADCAST,
            });
            Some(HostInfo {
                interface: e.name.clone(),
                ip,
                mac: e.mac.unwrap_or([0; 6]),
                broadcast,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str, ip: Option<[u8; 4]>) -> IfaceEntry {
        IfaceEntry {
            name: name.to_string(),
            up: true,
            ip: ip.map(Ipv4Addr::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_skips_loopback_and_down() {
        let mut lo = iface("lo", Some([127, 0, 0, 1]));
        lo.loopback = true;
        let mut down = iface("eth1", Some([10, 0, 0, 1]));
        down.up = false;
        let no_ip = iface("wlan0", None);
        let mut eth0 = iface("eth0", Some([192, 168, 2, 7]));
        eth0.mac = Some([0xB8, 0x27, 0xEB, 1, 2, 3]);
        eth0.broadcast = Some(Ipv4Addr::new(192, 168, 2, 255));

        let host = select_host(&[lo, down, no_ip, eth0]).unwrap();
        assert_eq!(host.interface, "eth0");
        assert_eq!(host.mac, [0xB8, 0x27, 0xEB, 1, 2, 3]);
        assert_eq!(host.broadcast, Ipv4Addr::new(192, 168, 2, 255));
    }

    #[test]
    fn test_broadcast_from_netmask() {
        let mut eth0 = iface("eth0", Some([10, 1, 2, 3]));
        eth0.netmask = Some(Ipv4Addr::new(255, 255, 0, 0));
        let host = select_host(&[eth0]).unwrap();
        assert_eq!(host.broadcast, Ipv4Addr::new(10, 1, 255, 255));
        assert_eq!(host.mac, [0; 6]);
    }

    #[test]
    fn test_none_usable() {
        let mut lo = iface("lo", Some([127, 0, 0, 1]));
        lo.loopback = true;
        assert!(select_host(&[lo]).is_none());
    }
}
