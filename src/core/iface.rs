//! The set of local interfaces and the static routing table.
//!
//! Both are fixed at startup and never mutated afterwards, so they are shared
//! across threads without locking.

use core::repr::{
    EthernetAddress,
    Ipv4Address,
};

/// A local interface the router sends and receives frames on.
#[derive(Clone, Debug)]
pub struct Interface {
    pub name: String,
    pub ethernet_addr: EthernetAddress,
    pub ipv4_addr: Ipv4Address,
}

/// A static route toward a destination network.
#[derive(Clone, Debug)]
pub struct Route {
    pub dest: Ipv4Address,
    pub mask: Ipv4Address,
    pub gateway: Ipv4Address,
    pub iface: String,
}

/// The registry of local interfaces.
#[derive(Debug)]
pub struct Interfaces {
    interfaces: Vec<Interface>,
}

impl Interfaces {
    pub fn new(interfaces: Vec<Interface>) -> Interfaces {
        Interfaces { interfaces }
    }

    /// Finds an interface by name.
    pub fn lookup(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }

    /// Finds an interface by an exact IPv4 address match.
    pub fn lookup_by_ip(&self, ipv4_addr: Ipv4Address) -> Option<&Interface> {
        self.interfaces
            .iter()
            .find(|iface| iface.ipv4_addr == ipv4_addr)
    }

    /// Checks if any local interface owns the address.
    pub fn has_ip(&self, ipv4_addr: Ipv4Address) -> bool {
        self.lookup_by_ip(ipv4_addr).is_some()
    }

    pub fn iter(&self) -> ::std::slice::Iter<Interface> {
        self.interfaces.iter()
    }
}

/// The static routing table, longest-prefix matched.
#[derive(Debug)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    /// Creates a routing table; registration order breaks prefix-length ties.
    pub fn new(routes: Vec<Route>) -> RoutingTable {
        RoutingTable { routes }
    }

    /// Selects the route whose masked destination matches `dst_addr` with the
    /// longest mask.
    pub fn route(&self, dst_addr: Ipv4Address) -> Option<&Route> {
        let mut selected: Option<&Route> = None;
        let mut selected_mask_len = 0;

        for route in &self.routes {
            let mask = route.mask.as_u32();

            if (dst_addr.as_u32() & mask) != (route.dest.as_u32() & mask) {
                continue;
            }

            let mask_len = route.mask.mask_len();

            match selected {
                Some(_) if mask_len <= selected_mask_len => {}
                _ => {
                    selected = Some(route);
                    selected_mask_len = mask_len;
                }
            }
        }

        selected
    }

    pub fn iter(&self) -> ::std::slice::Iter<Route> {
        self.routes.iter()
    }
}
