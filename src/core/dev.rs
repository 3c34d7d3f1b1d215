//! Transport for moving raw Ethernet frames in and out of the router.

use std::mem;
use std::sync::Mutex;

use Result;

/// A low level transport for sending frames on a named interface.
///
/// Frames are handed over complete with their Ethernet header and the
/// transmit is fire-and-forget. Sending takes `&self` since both the ingress
/// handlers and the timekeeper emit frames; implementations use interior
/// mutability where needed.
pub trait Device {
    /// Sends a frame across the link attached to the named interface.
    fn send(&self, frame: &[u8], iface_name: &str) -> Result<()>;
}

/// A `Device` that records transmitted frames in memory.
///
/// Useful for tests and dry runs of the pipeline without a real link.
#[derive(Debug, Default)]
pub struct MockDevice {
    sent: Mutex<Vec<(Vec<u8>, String)>>,
}

impl MockDevice {
    pub fn new() -> MockDevice {
        MockDevice {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Drains and returns the frames transmitted so far, oldest first.
    pub fn take_sent(&self) -> Vec<(Vec<u8>, String)> {
        let mut sent = self.sent.lock().unwrap();
        mem::replace(&mut *sent, Vec::new())
    }
}

impl Device for MockDevice {
    fn send(&self, frame: &[u8], iface_name: &str) -> Result<()> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((frame.to_vec(), iface_name.to_string()));
        Ok(())
    }
}
