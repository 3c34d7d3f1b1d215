//! An expiring IPv4 -> Ethernet address cache with request queueing.
//!
//! Next hops without a resolved entry get an outstanding request that parks
//! complete, egress-ready frames until an ARP reply arrives or the retry
//! budget runs out. All operations hand owned data back to the caller so
//! frame emission never happens under the cache lock.

use std::collections::HashMap;
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
use core::repr::{
    EthernetAddress,
    Ipv4Address,
};

/// Seconds a resolved entry stays valid.
pub const ENTRY_TIMEOUT_SECS: u64 = 15;

/// Seconds between retransmissions of an unanswered request.
pub const RETRY_INTERVAL_SECS: u64 = 1;

/// Broadcasts attempted before a next hop is declared unreachable.
pub const MAX_REQUEST_ATTEMPTS: usize = 5;

/// A complete Ethernet frame parked behind an unresolved next hop.
#[derive(Debug)]
pub struct PendingFrame {
    /// The frame, with everything but the destination MAC filled in.
    pub buffer: Vec<u8>,
    /// Egress interface the frame leaves on once resolved.
    pub iface: String,
}

/// An unresolved request detached from the cache for draining.
#[derive(Debug)]
pub struct PendingRequest {
    pub frames: Vec<PendingFrame>,
}

/// Outcome of queueing a frame behind an unresolved next hop.
#[derive(Debug)]
pub enum QueueResult {
    /// An entry appeared since the caller's lookup miss; send with this MAC
    /// immediately.
    Resolved(EthernetAddress),
    /// Frame parked on a brand new request. The cache has recorded the first
    /// send, so the caller must broadcast an ARP request now.
    NewRequest,
    /// Frame parked behind an already outstanding request.
    Pending,
}

/// Work handed back to the timekeeper by the retry state machine.
#[derive(Debug)]
pub enum TickAction {
    /// Broadcast another ARP request for `ip` on `iface`.
    Retransmit { ip: Ipv4Address, iface: String },
    /// The retry budget ran out; each frame needs a Host Unreachable toward
    /// its original source.
    GiveUp { frames: Vec<PendingFrame> },
}

struct Entry {
    eth_addr: EthernetAddress,
    in_cache_since: Instant,
}

struct Request {
    times_sent: usize,
    last_sent_at: Instant,
    iface: String,
    frames: Vec<PendingFrame>,
}

struct Inner<T: Clock> {
    entries: HashMap<Ipv4Address, Entry>,
    requests: HashMap<Ipv4Address, Request>,
    clock: T,
}

/// Maintains an expiring set of IPv4 -> Ethernet address mappings and the
/// outstanding requests for unresolved next hops.
pub struct ArpCache<T = SystemClock>
where
    T: Clock,
{
    inner: Mutex<Inner<T>>,
    expiration: Duration,
}

impl<T: Clock> ArpCache<T> {
    pub fn new(clock: T) -> ArpCache<T> {
        ArpCache {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                requests: HashMap::new(),
                clock,
            }),
            expiration: Duration::from_secs(ENTRY_TIMEOUT_SECS),
        }
    }

    /// Returns a snapshot of the Ethernet address for an IPv4 address if an
    /// unexpired entry exists.
    pub fn lookup(&self, ipv4_addr: Ipv4Address) -> Option<EthernetAddress> {
        let inner = self.inner.lock().unwrap();
        let now = inner.clock.now();

        match inner.entries.get(&ipv4_addr) {
            Some(entry) if now.duration_since(entry.in_cache_since) <= self.expiration => {
                Some(entry.eth_addr)
            }
            _ => None,
        }
    }

    /// Installs or refreshes the entry for an IPv4 address.
    ///
    /// Any outstanding request for the address is detached and returned so
    /// the caller can drain its queued frames after the lock is released.
    pub fn insert(
        &self,
        ipv4_addr: Ipv4Address,
        eth_addr: EthernetAddress,
    ) -> Option<PendingRequest> {
        let mut inner = self.inner.lock().unwrap();
        let in_cache_since = inner.clock.now();

        inner.entries.insert(
            ipv4_addr,
            Entry {
                eth_addr,
                in_cache_since,
            },
        );

        inner
            .requests
            .remove(&ipv4_addr)
            .map(|request| PendingRequest {
                frames: request.frames,
            })
    }

    /// Parks an owned copy of a frame behind the request for an IPv4
    /// address, creating the request if none exists.
    pub fn queue(&self, ipv4_addr: Ipv4Address, frame: &[u8], iface: &str) -> QueueResult {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock.now();

        // An entry may have raced in since the caller's lookup miss. Never
        // keep an entry and a request for the same address.
        if let Some(entry) = inner.entries.get(&ipv4_addr) {
            if now.duration_since(entry.in_cache_since) <= self.expiration {
                return QueueResult::Resolved(entry.eth_addr);
            }
        }

        let pending = PendingFrame {
            buffer: frame.to_vec(),
            iface: iface.to_string(),
        };

        match inner.requests.get_mut(&ipv4_addr) {
            Some(request) => {
                request.frames.push(pending);
                return QueueResult::Pending;
            }
            None => {}
        }

        inner.requests.insert(
            ipv4_addr,
            Request {
                times_sent: 1,
                last_sent_at: now,
                iface: iface.to_string(),
                frames: vec![pending],
            },
        );

        QueueResult::NewRequest
    }

    /// Drops the request for an IPv4 address, discarding its frames unsent.
    pub fn destroy(&self, ipv4_addr: Ipv4Address) {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.remove(&ipv4_addr);
    }

    /// Runs one expiry scan: evicts stale entries and advances the retry
    /// state machine of every outstanding request.
    pub fn tick(&self) -> Vec<TickAction> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock.now();

        let expiration = self.expiration;
        inner
            .entries
            .retain(|_, entry| now.duration_since(entry.in_cache_since) <= expiration);

        let retry_after = Duration::from_secs(RETRY_INTERVAL_SECS);
        let mut actions = Vec::new();
        let mut failed = Vec::new();

        for (ip, request) in inner.requests.iter_mut() {
            if now.duration_since(request.last_sent_at) < retry_after {
                continue;
            }

            if request.times_sent >= MAX_REQUEST_ATTEMPTS {
                failed.push(*ip);
            } else {
                request.times_sent += 1;
                request.last_sent_at = now;
                actions.push(TickAction::Retransmit {
                    ip: *ip,
                    iface: request.iface.clone(),
                });
            }
        }

        for ip in failed {
            if let Some(request) = inner.requests.remove(&ip) {
                actions.push(TickAction::GiveUp {
                    frames: request.frames,
                });
            }
        }

        actions
    }
}

#[cfg(test)]
impl ArpCache<ManualClock> {
    fn advance(&self, duration: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.clock.step(duration);
    }
}
