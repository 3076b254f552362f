//! Address resolution as in RFC 826 (https://tools.ietf.org/html/rfc826).
//!
//! When routing has picked a next hop whose hardware address is not in the cache, the datagram is
//! parked on a pending request for that address and a request is broadcast on the egress link.
//! Further datagrams for the same next hop join the same request. A reply moves the address into
//! the cache and releases the parked datagrams for forwarding. The sweep retransmits unanswered
//! requests and, after the last attempt, hands the parked datagrams back so each can be answered
//! with an ICMP host unreachable.

mod cache;
pub use self::cache::*;

mod request;
pub use self::request::*;

mod sweep;
pub use self::sweep::*;
