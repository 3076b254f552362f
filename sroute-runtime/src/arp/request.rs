use sroute_packets::{MacAddr, PacketData};
use std::net::Ipv4Addr;
use std::time::Instant;

/// A frame waiting for its next hop to resolve, kept whole so it can be forwarded as if it had
/// just arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedPacket {
    pub frame: PacketData,
    /// Where the frame came in, which is where an ICMP error about it has to go out.
    pub arrival_interface: String,
}

impl QueuedPacket {
    pub fn new(frame: PacketData, arrival_interface: &str) -> Self {
        QueuedPacket {
            frame,
            arrival_interface: String::from(arrival_interface),
        }
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }
}

/// An outstanding request for the hardware address of `ip`.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    pub ip: Ipv4Addr,
    /// Interface the requests are broadcast on.
    pub interface: String,
    pub last_sent: Instant,
    pub attempts: u32,
    pub packets: Vec<QueuedPacket>,
}

impl PendingRequest {
    pub(crate) fn new(ip: Ipv4Addr, interface: &str, now: Instant) -> Self {
        PendingRequest {
            ip,
            interface: String::from(interface),
            last_sent: now,
            attempts: 1,
            packets: vec![],
        }
    }
}

/// What became of a packet handed to [`ArpCache::enqueue`](crate::arp::ArpCache::enqueue).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Enqueued {
    /// The address was resolved by the time the cache was consulted. The packet was not kept and
    /// should be sent to this hardware address.
    Resolved(MacAddr),
    /// The packet opened a new request. The caller broadcasts the first ARP request.
    Requested,
    /// The packet joined a request already outstanding.
    Queued,
}

/// A request the sweep wants broadcast again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retransmit {
    pub ip: Ipv4Addr,
    pub interface: String,
}

/// What one sweep decided. The caller performs the I/O.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub retransmit: Vec<Retransmit>,
    /// Requests that ran out of attempts, removed from the cache with their parked packets.
    pub failed: Vec<PendingRequest>,
}
