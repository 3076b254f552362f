use crate::Router;
use futures::future::{abortable, AbortHandle};
use std::sync::Arc;
use std::time::Instant;
use tokio::time;
use tracing::info;

/// Handle to a running ARP sweep. The task stops when the handle is stopped or dropped.
#[derive(Debug)]
pub struct ArpSweep {
    handle: AbortHandle,
}

impl ArpSweep {
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ArpSweep {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns the periodic maintenance of the router's ARP cache onto the current tokio runtime.
/// Every `sweep_interval` it retransmits requests that went unanswered, answers the packets of
/// exhausted requests with host unreachable, and purges stale entries.
///
/// # Panics
/// If called outside a tokio runtime, or with a zero `sweep_interval`.
pub fn start_arp_sweep(router: Arc<Router>) -> ArpSweep {
    let period = router.arp_cache().config().sweep_interval;
    let (task, handle) = abortable(async move {
        let mut ticks = time::interval(period);
        loop {
            ticks.tick().await;
            router.sweep_arp(Instant::now());
        }
    });
    info!(?period, "starting ARP sweep");
    tokio::spawn(task);
    ArpSweep { handle }
}
