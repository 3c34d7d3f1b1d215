//! Packet processing services for different network layers.
//!
//! The `service` modules deal with frame reception, forwarding and emission
//! logic at the different layers of the router.

pub mod arp;
pub mod ethernet;
pub mod icmpv4;
pub mod ipv4;
pub mod nat;

use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::time::Duration;

use core::arp_cache::{
    ArpCache,
    TickAction,
};
use core::clock::SystemClock;
use core::config::Config;
use core::dev::Device;
use core::iface::{
    Interfaces,
    RoutingTable,
};
use core::nat::{
    NatTable,
    Timeouts,
};
use core::repr::EthernetFrame;
use {
    Error,
    Result,
};

/// A software IPv4 router bound to a set of virtual interfaces.
///
/// The NIC transport invokes `handle_frame(...)` per received frame, and the
/// timekeeper invokes `tick()` once a second. Both entry points share the
/// router through an `Arc`, so everything here takes `&self`.
pub struct Router<D: Device> {
    dev: D,
    interfaces: Interfaces,
    routes: RoutingTable,
    arp_cache: ArpCache,
    nat: Option<NatTable>,
    ip_ident: AtomicUsize,
}

impl<D: Device> Router<D> {
    /// Creates a router over a transport, an interface registry and a static
    /// routing table.
    ///
    /// # Errors
    ///
    /// Causes an error if NAT is enabled without a resolvable externally
    /// facing interface.
    pub fn new(
        dev: D,
        interfaces: Interfaces,
        routes: RoutingTable,
        config: Config,
    ) -> Result<Router<D>> {
        let nat = if config.nat_enabled {
            let name = match config.external_iface {
                Some(ref name) => name,
                None => return Err(Error::Address),
            };
            let external = match interfaces.lookup(name) {
                Some(iface) => iface,
                None => return Err(Error::Address),
            };

            Some(NatTable::new(
                external.ipv4_addr,
                Timeouts {
                    icmp: Duration::from_secs(config.icmp_timeout),
                    tcp_established: Duration::from_secs(config.tcp_established_timeout),
                    tcp_transitory: Duration::from_secs(config.tcp_transitory_timeout),
                },
                SystemClock::new(),
            ))
        } else {
            None
        };

        Ok(Router {
            dev,
            interfaces,
            routes,
            arp_cache: ArpCache::new(SystemClock::new()),
            nat,
            ip_ident: AtomicUsize::new(0),
        })
    }

    /// Processes a frame received on the named interface.
    ///
    /// The buffer is only borrowed for the duration of the call; anything
    /// that outlives it (queued frames, emissions) is an owned copy.
    pub fn handle_frame(&self, frame: &[u8], iface_name: &str) -> Result<()> {
        ethernet::recv_frame(self, frame, iface_name)
    }

    /// Runs one expiry scan over the ARP cache and the NAT table.
    ///
    /// Emission of retry broadcasts and Host Unreachables happens here, after
    /// the respective locks are released.
    pub fn tick(&self) {
        for action in self.arp_cache.tick() {
            match action {
                TickAction::Retransmit { ip, iface } => match self.interfaces.lookup(&iface) {
                    Some(iface) => {
                        debug!("Retrying ARP request for {} on {}.", ip, iface.name);
                        if let Err(err) = arp::send_request(self, iface, ip) {
                            debug!("Error retrying ARP request for {} with {:?}.", ip, err);
                        }
                    }
                    None => debug!("Dropping ARP retry for {} on unknown interface.", ip),
                },
                TickAction::GiveUp { frames } => {
                    debug!("ARP resolution failed; rejecting {} frames.", frames.len());
                    for frame in frames {
                        if frame.buffer.len() <= EthernetFrame::<&[u8]>::HEADER_LEN {
                            continue;
                        }
                        let datagram = &frame.buffer[EthernetFrame::<&[u8]>::HEADER_LEN ..];
                        if let Err(err) = icmpv4::send_host_unreachable(self, datagram) {
                            debug!("Error sending host unreachable with {:?}.", err);
                        }
                    }
                }
            }
        }

        if let Some(ref nat) = self.nat {
            nat.expire();
        }
    }

    pub fn dev(&self) -> &D {
        &self.dev
    }

    pub fn interfaces(&self) -> &Interfaces {
        &self.interfaces
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn arp_cache(&self) -> &ArpCache {
        &self.arp_cache
    }

    pub fn nat(&self) -> Option<&NatTable> {
        self.nat.as_ref()
    }

    /// Returns the next IP identification value.
    pub fn next_ident(&self) -> u16 {
        self.ip_ident.fetch_add(1, Ordering::Relaxed) as u16
    }
}
