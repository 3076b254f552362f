use crate::arp::{Enqueued, PendingRequest, QueuedPacket, Retransmit, SweepOutcome};
use crate::config::ArpConfig;
use sroute_packets::MacAddr;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
struct ArpEntry {
    mac: MacAddr,
    added: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Ipv4Addr, ArpEntry>,
    // In creation order, so sweeps visit requests deterministically.
    requests: Vec<PendingRequest>,
}

/// IPv4 to hardware address cache together with the requests still waiting on a reply.
///
/// Shared between the packet path and the sweep task. Every method takes the one lock for the
/// duration of its mutation and returns owned results, so nothing is sent while it is held.
/// All methods take the current time explicitly.
pub struct ArpCache {
    config: ArpConfig,
    state: Mutex<CacheState>,
}

impl ArpCache {
    pub fn new(config: ArpConfig) -> Self {
        ArpCache {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> &ArpConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<CacheState> {
        // The state stays consistent even if a holder panicked, every mutation is a single step.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expired(&self, entry: &ArpEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.added) >= self.config.cache_ttl
    }

    /// Returns the hardware address of `ip` if it is cached and still fresh. Stale entries are
    /// dropped on the way.
    pub fn lookup(&self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        let mut state = self.state();
        match state.entries.get(&ip) {
            Some(entry) if !self.expired(entry, now) => Some(entry.mac),
            Some(_) => {
                state.entries.remove(&ip);
                None
            }
            None => None,
        }
    }

    /// Records `ip` at `mac` and resolves the pending request for `ip`, if any. Returns the packets
    /// that were waiting on it, in arrival order, for the caller to forward.
    pub fn insert(&self, ip: Ipv4Addr, mac: MacAddr, now: Instant) -> Vec<QueuedPacket> {
        let mut state = self.state();
        state.entries.insert(ip, ArpEntry { mac, added: now });
        match state.requests.iter().position(|request| request.ip == ip) {
            Some(index) => state.requests.remove(index).packets,
            None => vec![],
        }
    }

    /// Parks `packet` until `ip` resolves. If a reply for `ip` was cached since the caller's
    /// [`lookup`](ArpCache::lookup), the packet is not kept and the address is returned instead.
    /// A packet that opens a new request obliges the caller to broadcast the first ARP request on
    /// `interface`; packets for an address that already has a request outstanding just join its
    /// queue.
    pub fn enqueue(
        &self,
        ip: Ipv4Addr,
        interface: &str,
        packet: QueuedPacket,
        now: Instant,
    ) -> Enqueued {
        let mut state = self.state();
        if let Some(entry) = state.entries.get(&ip) {
            if !self.expired(entry, now) {
                return Enqueued::Resolved(entry.mac);
            }
        }
        if let Some(request) = state.requests.iter_mut().find(|request| request.ip == ip) {
            request.packets.push(packet);
            return Enqueued::Queued;
        }
        let mut request = PendingRequest::new(ip, interface, now);
        request.packets.push(packet);
        state.requests.push(request);
        Enqueued::Requested
    }

    /// One pass of the periodic maintenance: requests quiet for at least the retry interval are
    /// either scheduled for retransmission or, once out of attempts, removed and returned as
    /// failed.
    /// Cache entries past their time to live are purged.
    pub fn sweep(&self, now: Instant) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        let mut state = self.state();

        let config = self.config;
        let requests = std::mem::take(&mut state.requests);
        for mut request in requests {
            if now.saturating_duration_since(request.last_sent) < config.retry_interval {
                state.requests.push(request);
            } else if request.attempts >= config.max_attempts {
                debug!(ip = %request.ip, attempts = request.attempts, "ARP request exhausted");
                outcome.failed.push(request);
            } else {
                request.attempts += 1;
                request.last_sent = now;
                outcome.retransmit.push(Retransmit {
                    ip: request.ip,
                    interface: request.interface.clone(),
                });
                state.requests.push(request);
            }
        }

        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.added) < config.cache_ttl);
        let purged = before - state.entries.len();
        if purged > 0 {
            debug!(purged, "expired ARP entries");
        }

        outcome
    }

    pub fn is_pending(&self, ip: Ipv4Addr) -> bool {
        self.state().requests.iter().any(|request| request.ip == ip)
    }

    pub fn pending_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Number of cached addresses, stale ones included until they are swept.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const GATEWAY: Ipv4Addr = Ipv4Addr::new(10, 0, 2, 254);
    const GATEWAY_MAC: MacAddr = MacAddr {
        bytes: [2, 0, 0, 0, 2, 0xfe],
    };

    fn packet(id: u8) -> QueuedPacket {
        QueuedPacket::new(vec![id; 60], "eth1")
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn lookup_after_insert() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        assert_eq!(cache.lookup(GATEWAY, now), None);
        assert!(cache.insert(GATEWAY, GATEWAY_MAC, now).is_empty());
        assert_eq!(cache.lookup(GATEWAY, now + secs(14)), Some(GATEWAY_MAC));
    }

    #[test]
    fn entries_expire_lazily() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        cache.insert(GATEWAY, GATEWAY_MAC, now);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(GATEWAY, now + secs(15)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn reinsert_refreshes_timestamp() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        cache.insert(GATEWAY, GATEWAY_MAC, now);
        cache.insert(GATEWAY, GATEWAY_MAC, now + secs(10));
        assert_eq!(cache.lookup(GATEWAY, now + secs(20)), Some(GATEWAY_MAC));
    }

    #[test]
    fn one_request_per_address() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        assert_eq!(
            cache.enqueue(GATEWAY, "eth2", packet(1), now),
            Enqueued::Requested
        );
        assert_eq!(
            cache.enqueue(GATEWAY, "eth2", packet(2), now),
            Enqueued::Queued
        );
        assert_eq!(
            cache.enqueue(Ipv4Addr::new(10, 0, 3, 254), "eth3", packet(3), now),
            Enqueued::Requested
        );
        assert_eq!(cache.pending_count(), 2);
        assert!(cache.is_pending(GATEWAY));
    }

    #[test]
    fn enqueue_sees_reply_cached_after_lookup() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        assert_eq!(cache.lookup(GATEWAY, now), None);
        // The reply lands between the caller's lookup and its enqueue.
        cache.insert(GATEWAY, GATEWAY_MAC, now);
        assert_eq!(
            cache.enqueue(GATEWAY, "eth2", packet(1), now),
            Enqueued::Resolved(GATEWAY_MAC)
        );
        assert_eq!(cache.pending_count(), 0);
        assert!(cache.sweep(now + secs(5)).failed.is_empty());
    }

    #[test]
    fn enqueue_ignores_stale_entry() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        cache.insert(GATEWAY, GATEWAY_MAC, now);
        assert_eq!(
            cache.enqueue(GATEWAY, "eth2", packet(1), now + secs(15)),
            Enqueued::Requested
        );
        assert!(cache.is_pending(GATEWAY));
    }

    #[test]
    fn insert_releases_queue_in_order() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        cache.enqueue(GATEWAY, "eth2", packet(1), now);
        cache.enqueue(GATEWAY, "eth2", packet(2), now);

        let released = cache.insert(GATEWAY, GATEWAY_MAC, now);
        assert_eq!(released, vec![packet(1), packet(2)]);
        assert!(!cache.is_pending(GATEWAY));
        assert_eq!(cache.lookup(GATEWAY, now), Some(GATEWAY_MAC));
    }

    #[test]
    fn sweep_waits_for_retry_interval() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        cache.enqueue(GATEWAY, "eth2", packet(1), now);

        let outcome = cache.sweep(now + Duration::from_millis(500));
        assert!(outcome.retransmit.is_empty());
        assert!(outcome.failed.is_empty());

        let outcome = cache.sweep(now + secs(1));
        assert_eq!(
            outcome.retransmit,
            vec![Retransmit {
                ip: GATEWAY,
                interface: "eth2".to_string()
            }]
        );
    }

    #[test]
    fn sweep_gives_up_after_max_attempts() {
        let cache = ArpCache::new(ArpConfig::default());
        let start = Instant::now();
        cache.enqueue(GATEWAY, "eth2", packet(1), start);
        cache.enqueue(GATEWAY, "eth2", packet(2), start);

        // The first request went out on enqueue, the sweep sends the remaining four.
        for tick in 1..5 {
            let outcome = cache.sweep(start + secs(tick));
            assert_eq!(outcome.retransmit.len(), 1, "tick {}", tick);
            assert!(outcome.failed.is_empty());
        }

        let outcome = cache.sweep(start + secs(5));
        assert!(outcome.retransmit.is_empty());
        assert_eq!(outcome.failed.len(), 1);
        let failed = &outcome.failed[0];
        assert_eq!(failed.ip, GATEWAY);
        assert_eq!(failed.attempts, 5);
        assert_eq!(failed.packets, vec![packet(1), packet(2)]);
        assert_eq!(cache.pending_count(), 0);

        // A new packet opens a fresh request.
        assert_eq!(
            cache.enqueue(GATEWAY, "eth2", packet(3), start + secs(6)),
            Enqueued::Requested
        );
    }

    #[test]
    fn sweep_purges_expired_entries() {
        let cache = ArpCache::new(ArpConfig::default());
        let now = Instant::now();
        cache.insert(GATEWAY, GATEWAY_MAC, now);
        cache.insert(Ipv4Addr::new(10, 0, 3, 254), GATEWAY_MAC, now + secs(10));

        cache.sweep(now + secs(16));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.lookup(Ipv4Addr::new(10, 0, 3, 254), now + secs(16)),
            Some(GATEWAY_MAC)
        );
    }

    #[test]
    fn reply_after_exhaustion_only_caches() {
        let cache = ArpCache::new(ArpConfig {
            max_attempts: 1,
            ..ArpConfig::default()
        });
        let now = Instant::now();
        cache.enqueue(GATEWAY, "eth2", packet(1), now);
        assert_eq!(cache.sweep(now + secs(1)).failed.len(), 1);
        assert!(cache.insert(GATEWAY, GATEWAY_MAC, now + secs(1)).is_empty());
        assert_eq!(cache.lookup(GATEWAY, now + secs(1)), Some(GATEWAY_MAC));
    }
}
