//! Time sources for the router's expiry clocks.
//!
//! ARP entries, outstanding requests and NAT mappings all age against the
//! clock their owning table was built with, so tests can step time by hand
//! instead of sleeping through retry intervals and mapping timeouts.

use std::fmt::Debug;
use std::time::{
    Duration,
    Instant,
};

/// Provides the instants expiry decisions are measured against.
pub trait Clock: Clone + Debug {
    /// Samples the clock.
    fn now(&self) -> Instant;
}

/// Wall-clock time, used by a running router.
#[derive(Clone, Debug)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> SystemClock {
        SystemClock {}
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when stepped, for exercising timeouts in tests.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Instant,
}

impl ManualClock {
    /// Creates a clock pinned to the moment of construction.
    pub fn new() -> ManualClock {
        ManualClock {
            now: Instant::now(),
        }
    }

    /// Steps the clock forward by a duration.
    pub fn step(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now
    }
}
