//! Network interface enumeration for aria2 `--multiple-interface`.
//!
//! sysinfo only lists interfaces that carry addresses, which is the
//! practical meaning of "up" here.

use std::net::{IpAddr, Ipv4Addr};

use ariafetch_core::InterfaceProbe;
use sysinfo::Networks;
use tracing::debug;

/// Keep IPv4 addresses that are routable from this host's NICs.
///
/// Loopback, link-local (169.254/16) and unspecified addresses are dropped.
/// The result is sorted and free of duplicates.
pub fn select_bindable(addrs: impl IntoIterator<Item = IpAddr>) -> Vec<Ipv4Addr> {
    let mut selected: Vec<Ipv4Addr> = addrs
        .into_iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .filter(|v4| !v4.is_loopback() && !v4.is_link_local() && !v4.is_unspecified())
        .collect();
    selected.sort_unstable();
    selected.dedup();
    selected
}

/// `InterfaceProbe` backed by `sysinfo::Networks`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoInterfaceProbe;

impl InterfaceProbe for SysinfoInterfaceProbe {
    fn bindable_ipv4(&self) -> Vec<Ipv4Addr> {
        let networks = Networks::new_with_refreshed_list();
        let addrs = networks
            .iter()
            .flat_map(|(_, data)| data.ip_networks().iter().map(|net| net.addr));
        let selected = select_bindable(addrs);
        debug!(count = selected.len(), "Enumerated bindable IPv4 interfaces");
        selected
    }
}
