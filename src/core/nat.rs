//! A bidirectional NAT mapping table with idle expiry.
//!
//! Internal endpoints are rewritten to the router's external address with a
//! per-type identifier drawn from a fixed range. Lookups refresh a mapping's
//! idle clock; the timekeeper removes mappings idle past their timeout.

use std::sync::Mutex;
use std::time::{
    Duration,
    Instant,
};

#[cfg(test)]
use core::clock::ManualClock;
use core::clock::{
    Clock,
    SystemClock,
};
use core::repr::Ipv4Address;

/// First external identifier handed out per type.
pub const FIRST_EXTERNAL_AUX: u16 = 50000;

/// Last external identifier handed out per type, inclusive.
pub const LAST_EXTERNAL_AUX: u16 = 59999;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingType {
    Icmp,
    Tcp,
}

/// Connection tracking stub. TCP mappings age purely by idle time, so no
/// per-connection state is recorded yet.
#[derive(Clone, Debug)]
pub struct TcpConnection;

/// A snapshot of one endpoint translation.
#[derive(Clone, Debug)]
pub struct Mapping {
    pub mapping_type: MappingType,
    /// Endpoint address on the internal side.
    pub ip_int: Ipv4Address,
    /// The router's externally facing address.
    pub ip_ext: Ipv4Address,
    /// Internal port or ICMP identifier.
    pub aux_int: u16,
    /// External port or ICMP identifier.
    pub aux_ext: u16,
    pub last_updated: Instant,
}

/// Idle timeouts per mapping type.
#[derive(Clone, Debug)]
pub struct Timeouts {
    pub icmp: Duration,
    pub tcp_established: Duration,
    pub tcp_transitory: Duration,
}

struct Slot {
    mapping: Mapping,
    #[allow(dead_code)]
    conns: Vec<TcpConnection>,
}

struct Inner<T: Clock> {
    mappings: Vec<Slot>,
    next_icmp_ident: u16,
    next_tcp_port: u16,
    clock: T,
}

/// The NAT translation table.
pub struct NatTable<T = SystemClock>
where
    T: Clock,
{
    inner: Mutex<Inner<T>>,
    external_addr: Ipv4Address,
    timeouts: Timeouts,
}

impl<T: Clock> NatTable<T> {
    /// Creates a table translating internal endpoints to `external_addr`.
    pub fn new(external_addr: Ipv4Address, timeouts: Timeouts, clock: T) -> NatTable<T> {
        NatTable {
            inner: Mutex::new(Inner {
                mappings: Vec::new(),
                next_icmp_ident: FIRST_EXTERNAL_AUX,
                next_tcp_port: FIRST_EXTERNAL_AUX,
                clock,
            }),
            external_addr,
            timeouts,
        }
    }

    /// Returns the externally facing address mappings translate to.
    pub fn external_addr(&self) -> Ipv4Address {
        self.external_addr
    }

    /// Finds the mapping for an internal endpoint, refreshing its idle clock.
    pub fn lookup_internal(
        &self,
        mapping_type: MappingType,
        ip_int: Ipv4Address,
        aux_int: u16,
    ) -> Option<Mapping> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock.now();

        inner
            .mappings
            .iter_mut()
            .find(|slot| {
                slot.mapping.mapping_type == mapping_type && slot.mapping.ip_int == ip_int
                    && slot.mapping.aux_int == aux_int
            })
            .map(|slot| {
                slot.mapping.last_updated = now;
                slot.mapping.clone()
            })
    }

    /// Finds the mapping for an external identifier, refreshing its idle
    /// clock.
    pub fn lookup_external(&self, mapping_type: MappingType, aux_ext: u16) -> Option<Mapping> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock.now();

        inner
            .mappings
            .iter_mut()
            .find(|slot| {
                slot.mapping.mapping_type == mapping_type && slot.mapping.aux_ext == aux_ext
            })
            .map(|slot| {
                slot.mapping.last_updated = now;
                slot.mapping.clone()
            })
    }

    /// Creates a mapping for an internal endpoint, allocating a fresh
    /// external identifier.
    ///
    /// Returns `None` when every identifier of the type is in use; the
    /// caller drops the triggering packet.
    pub fn insert(
        &self,
        mapping_type: MappingType,
        ip_int: Ipv4Address,
        aux_int: u16,
    ) -> Option<Mapping> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock.now();

        let aux_ext = match self.allocate_aux(&mut *inner, mapping_type) {
            Some(aux_ext) => aux_ext,
            None => {
                warn!(
                    "NAT identifier space exhausted for {:?} mappings.",
                    mapping_type
                );
                return None;
            }
        };

        let mapping = Mapping {
            mapping_type,
            ip_int,
            ip_ext: self.external_addr,
            aux_int,
            aux_ext,
            last_updated: now,
        };

        inner.mappings.push(Slot {
            mapping: mapping.clone(),
            conns: Vec::new(),
        });

        Some(mapping)
    }

    /// Removes mappings idle past their type's timeout.
    pub fn expire(&self) {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock.now();
        let timeouts = self.timeouts.clone();

        inner.mappings.retain(|slot| {
            let timeout = match slot.mapping.mapping_type {
                MappingType::Icmp => timeouts.icmp,
                // Transitory and established lifetimes collapse until TCP
                // connection tracking lands.
                MappingType::Tcp => timeouts.tcp_established,
            };
            now.duration_since(slot.mapping.last_updated) <= timeout
        });
    }

    fn allocate_aux(&self, inner: &mut Inner<T>, mapping_type: MappingType) -> Option<u16> {
        let range = (LAST_EXTERNAL_AUX - FIRST_EXTERNAL_AUX + 1) as usize;

        for _ in 0 .. range {
            let candidate = {
                let counter = match mapping_type {
                    MappingType::Icmp => &mut inner.next_icmp_ident,
                    MappingType::Tcp => &mut inner.next_tcp_port,
                };
                let candidate = *counter;
                *counter = if candidate == LAST_EXTERNAL_AUX {
                    FIRST_EXTERNAL_AUX
                } else {
                    candidate + 1
                };
                candidate
            };

            let in_use = inner.mappings.iter().any(|slot| {
                slot.mapping.mapping_type == mapping_type && slot.mapping.aux_ext == candidate
            });

            if !in_use {
                return Some(candidate);
            }
        }

        None
    }
}

#[cfg(test)]
impl NatTable<ManualClock> {
    fn advance(&self, duration: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.clock.step(duration);
    }
}
