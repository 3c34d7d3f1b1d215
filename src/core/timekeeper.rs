//! A background thread driving ARP and NAT expiry.

use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;
use std::thread::{
    self,
    JoinHandle,
};
use std::time::Duration;

use core::dev::Device;
use core::service::Router;
use Result;

/// Seconds between expiry scans.
pub const TICK_INTERVAL_SECS: u64 = 1;

/// Handle to the expiry thread. Dropping the handle stops the thread.
pub struct Timekeeper {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Timekeeper {
    /// Spawns a thread ticking the router once a second.
    ///
    /// Ticks never overlap. A scan running long just delays the next one,
    /// which is harmless for expiry.
    pub fn spawn<D>(router: Arc<Router<D>>) -> Result<Timekeeper>
    where
        D: Device + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("timekeeper".to_string())
            .spawn(move || {
                while !thread_shutdown.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_secs(TICK_INTERVAL_SECS));

                    if thread_shutdown.load(Ordering::Relaxed) {
                        break;
                    }

                    router.tick();
                }
            })?;

        Ok(Timekeeper {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Stops and joins the expiry thread.
    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for Timekeeper {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
