use crossbeam::crossbeam_channel::Receiver;
use sroute_packets::*;
use sroute_runtime::config::ArpConfig;
use sroute_runtime::interface::{Interface, InterfaceTable};
use sroute_runtime::route::{RoutingEntry, RoutingTable};
use sroute_runtime::transmit::{ChannelTransmit, OutboundFrame};
use sroute_runtime::Router;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// The test topology:
///
/// ```text
///   host 192.168.0.7 ── eth0 192.168.0.1
///                        eth1 10.0.1.1    ── 10.0.1.0/24, 10.1.0.0/16 via 10.0.1.254
///                        eth2 172.16.0.2  ── everything else via 172.16.0.1
/// ```
pub const HOST_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0x09, 0x09],
};
pub const HOST_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 7);

pub const ETH0_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0, 0x01],
};
pub const ETH0_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 1);
pub const ETH1_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0x01, 0x01],
};
pub const ETH1_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 1, 1);
pub const ETH2_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0x02, 0x01],
};
pub const ETH2_IP: Ipv4Addr = Ipv4Addr::new(172, 16, 0, 2);

pub const GATEWAY_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0x02, 0xfe],
};
pub const GATEWAY_IP: Ipv4Addr = Ipv4Addr::new(172, 16, 0, 1);
pub const LAN_GATEWAY_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 1, 254);

pub fn interfaces() -> InterfaceTable {
    InterfaceTable::new(vec![
        Interface::new("eth0", ETH0_MAC, ETH0_IP),
        Interface::new("eth1", ETH1_MAC, ETH1_IP),
        Interface::new("eth2", ETH2_MAC, ETH2_IP),
    ])
}

pub fn routes() -> Vec<RoutingEntry> {
    vec![
        RoutingEntry::new(
            Ipv4Addr::new(0, 0, 0, 0),
            Ipv4Addr::new(0, 0, 0, 0),
            GATEWAY_IP,
            "eth2",
        ),
        RoutingEntry::new(
            Ipv4Addr::new(10, 0, 0, 0),
            Ipv4Addr::new(255, 0, 0, 0),
            GATEWAY_IP,
            "eth2",
        ),
        RoutingEntry::new(
            Ipv4Addr::new(10, 1, 0, 0),
            Ipv4Addr::new(255, 255, 0, 0),
            LAN_GATEWAY_IP,
            "eth1",
        ),
        RoutingEntry::new(
            Ipv4Addr::new(10, 0, 1, 0),
            Ipv4Addr::new(255, 255, 255, 0),
            Ipv4Addr::UNSPECIFIED,
            "eth1",
        ),
        RoutingEntry::new(
            Ipv4Addr::new(192, 168, 0, 0),
            Ipv4Addr::new(255, 255, 255, 0),
            Ipv4Addr::UNSPECIFIED,
            "eth0",
        ),
    ]
}

/// A router wired to a channel that collects everything it transmits.
pub struct TestRouter {
    pub router: Arc<Router>,
    pub output: Receiver<OutboundFrame>,
}

impl TestRouter {
    pub fn new() -> Self {
        TestRouter::with(routes(), ArpConfig::default())
    }

    pub fn with(routes: Vec<RoutingEntry>, config: ArpConfig) -> Self {
        let (transmit, output) = ChannelTransmit::unbounded();
        let router = Router::new(interfaces(), RoutingTable::new(routes), Arc::new(transmit))
            .arp_config(config);
        TestRouter {
            router: Arc::new(router),
            output,
        }
    }

    pub fn receive(&self, frame: &[u8], interface: &str) {
        self.router.handle_incoming(frame, interface);
    }

    /// Everything transmitted since the last call.
    pub fn sent(&self) -> Vec<OutboundFrame> {
        self.output.try_iter().collect()
    }
}

/// An IPv4 datagram from `src` to `dst` wrapped in an Ethernet frame from the host to eth0.
pub fn ipv4_frame(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    protocol: IpProtocol,
    ttl: u8,
    payload: &[u8],
) -> PacketData {
    let mut header = build_ip_header(src, dst, protocol, payload.len()).unwrap();
    header.ttl = ttl;
    let mut datagram = header.to_bytes().to_vec();
    fill_header_checksum(&mut datagram);
    datagram.extend_from_slice(payload);
    EthernetHeader::new(ETH0_MAC, HOST_MAC, IPV4_ETHER_TYPE).encap(&datagram)
}

pub fn udp_frame(dst: Ipv4Addr, ttl: u8) -> PacketData {
    ipv4_frame(HOST_IP, dst, IpProtocol::UDP, ttl, &[0x5a; 16])
}

pub fn echo_request_frame(
    dst: Ipv4Addr,
    identifier: u16,
    sequence: u16,
    data: &[u8],
) -> PacketData {
    let mut echo = IcmpEchoHeader {
        icmp_type: ICMP_ECHO_REQUEST,
        code: 0,
        checksum: 0,
        identifier,
        sequence,
    };
    echo.fill_checksum(data);
    let mut message = echo.to_bytes().to_vec();
    message.extend_from_slice(data);
    ipv4_frame(HOST_IP, dst, IpProtocol::ICMP, 64, &message)
}

pub fn arp_frame(
    opcode: ArpOp,
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
) -> PacketData {
    let arp = build_arp_header(opcode, sender_mac, sender_ip, target_mac, target_ip);
    let dest = match opcode {
        ArpOp::Request => MacAddr::BROADCAST,
        ArpOp::Reply => target_mac,
    };
    EthernetHeader::new(dest, sender_mac, ARP_ETHER_TYPE).encap(&arp.to_bytes())
}

/// The ARP reply the default gateway sends when asked by eth2.
pub fn gateway_reply() -> PacketData {
    arp_frame(ArpOp::Reply, GATEWAY_MAC, GATEWAY_IP, ETH2_MAC, ETH2_IP)
}

pub fn parse_ipv4(frame: &[u8]) -> (EthernetHeader, Ipv4Header) {
    let (ethernet, offset) = parse_ethernet(frame).unwrap();
    assert_eq!(ethernet.ether_type, IPV4_ETHER_TYPE);
    let ip = Ipv4Header::parse(&frame[offset..]).unwrap();
    assert!(header_checksum_valid(
        &frame[offset..offset + ip.header_len()]
    ));
    (ethernet, ip)
}

pub fn parse_arp(frame: &[u8]) -> (EthernetHeader, ArpHeader) {
    let (ethernet, offset) = parse_ethernet(frame).unwrap();
    assert_eq!(ethernet.ether_type, ARP_ETHER_TYPE);
    (ethernet, ArpHeader::parse(&frame[offset..]).unwrap())
}

/// Parses an ICMP error frame, checking both checksums on the way.
pub fn parse_icmp_error(frame: &[u8]) -> (EthernetHeader, Ipv4Header, IcmpErrorHeader) {
    let (ethernet, ip) = parse_ipv4(frame);
    assert_eq!(ip.protocol, IpProtocol::ICMP);
    let message = &frame[ETHERNET_HEADER_LEN + ip.header_len()..];
    assert!(icmp_checksum_valid(message));
    (ethernet, ip, IcmpErrorHeader::parse(message).unwrap())
}

pub fn is_arp_request_for(frame: &OutboundFrame, interface: &str, target: Ipv4Addr) -> bool {
    if frame.interface != interface {
        return false;
    }
    match parse_ethernet(&frame.data) {
        Ok((ethernet, offset)) if ethernet.ether_type == ARP_ETHER_TYPE => {
            match ArpHeader::parse(&frame.data[offset..]) {
                Ok(arp) => {
                    ethernet.dest_mac == MacAddr::BROADCAST
                        && arp.opcode == ArpOp::Request
                        && arp.target_ip == target
                }
                Err(_) => false,
            }
        }
        _ => false,
    }
}
