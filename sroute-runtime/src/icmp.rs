use sroute_packets::*;
use std::net::Ipv4Addr;

/// The ICMP errors the router answers with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IcmpError {
    NetUnreachable,
    HostUnreachable,
    PortUnreachable,
    TtlExceeded,
}

impl IcmpError {
    fn header(self, original: &[u8]) -> IcmpErrorHeader {
        match self {
            IcmpError::NetUnreachable => {
                build_icmp_type3_header(IcmpUnreachable::Network as u8, original)
            }
            IcmpError::HostUnreachable => {
                build_icmp_type3_header(IcmpUnreachable::Host as u8, original)
            }
            IcmpError::PortUnreachable => {
                build_icmp_type3_header(IcmpUnreachable::Port as u8, original)
            }
            IcmpError::TtlExceeded => build_icmp_time_exceeded_header(original),
        }
    }
}

/// Builds the complete Ethernet frame carrying an ICMP error about `original`, the offending
/// datagram from its IP header on. The error goes back to the original source, from `src_ip`,
/// over the link the datagram came in on. Returns `None` if no error may be generated and the
/// datagram should be discarded silently instead.
///
/// # Arguments
///
/// * `ethernet` - Header of the frame that carried the offending datagram
/// * `iface_mac` - Hardware address of the interface the datagram arrived on
pub(crate) fn error_frame(
    kind: IcmpError,
    ethernet: &EthernetHeader,
    iface_mac: MacAddr,
    src_ip: Ipv4Addr,
    original: &[u8],
) -> Option<PacketData> {
    let offending = Ipv4Header::parse(original).ok()?;
    if !should_generate_error(&offending, original) {
        return None;
    }

    let icmp = kind.header(original);
    let ip = build_ip_header(src_ip, offending.src_addr, IpProtocol::ICMP, ICMP_ERROR_LEN).ok()?;

    let mut payload = [0; IPV4_HEADER_LEN + ICMP_ERROR_LEN];
    ip.emit(&mut payload[..IPV4_HEADER_LEN]);
    icmp.emit(&mut payload[IPV4_HEADER_LEN..]);

    Some(EthernetHeader::new(ethernet.src_mac, iface_mac, IPV4_ETHER_TYPE).encap(&payload))
}

// Performs checks based on RFC 1812 4.3.2.7 (When Not to Send ICMP Errors)
fn should_generate_error(header: &Ipv4Header, datagram: &[u8]) -> bool {
    // Only the first fragment
    if header.fragment_offset() != 0 {
        return false;
    }
    // Avoid infinite loops, no errors from errors
    if header.protocol == IpProtocol::ICMP {
        match datagram.get(header.header_len()) {
            Some(&icmp_type) if !is_error_type(icmp_type) => {}
            _ => return false,
        }
    }
    // No broadcast, multicast, unspecified or loopback sources
    let src = header.src_addr;
    !(src.is_broadcast() || src.is_multicast() || src.is_unspecified() || src.is_loopback())
}
