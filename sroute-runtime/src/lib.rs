extern crate crossbeam;
extern crate tokio;

/// Interfaces are the router's own attachment points: a name the I/O layer knows the port by, the
/// hardware address frames leave with, and the IPv4 address the router answers to on that link. They
/// are fixed once the router is built and are consulted on every frame to decide whether traffic is
/// addressed to the router or only passing through.
pub mod interface;

/// The static routing table. Entries are kept in the order they were loaded and looked up with a
/// longest-prefix match over the 32-bit address, so the most specific route wins and equally specific
/// routes resolve to the one seen first.
pub mod route;

/// Address resolution. The cache maps next-hop IPv4 addresses to hardware addresses, parks datagrams
/// behind outstanding requests, and is swept periodically by a background task that retransmits
/// requests and gives up on hosts that never answer. Everything lives behind one lock per cache; the
/// cache itself never touches the network, it tells the router what to send.
pub mod arp;

/// The router proper: the per-frame dispatch state machine that sorts ARP from IPv4, local from
/// transit traffic, and decides between replying, forwarding, parking the datagram until the next hop
/// resolves, or answering with an ICMP error. If you are looking for a place to start, start there.
pub mod router;

/// The seam to the link layer. The router hands finished frames to a `Transmit` implementation and
/// never keeps them afterwards.
pub mod transmit;

/// Tunables for address resolution and loaders for the static interface and routing tables.
pub mod config;

/// Runner is a user facing helper for driving a router from a channel of received frames.
pub mod runner;

mod error;
pub use self::error::*;

mod icmp;

pub use self::arp::{start_arp_sweep, ArpSweep};
pub use self::router::Router;
