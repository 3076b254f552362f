use crate::arp::{ArpCache, Enqueued, QueuedPacket};
use crate::config::ArpConfig;
use crate::icmp::{self, IcmpError};
use crate::interface::{Interface, InterfaceTable};
use crate::route::RoutingTable;
use crate::transmit::Transmit;
use crate::RouterError;
use sroute_packets::*;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, trace, warn};

/// A static IPv4 router.
///
/// Frames come in through `handle_incoming`, one call per received frame, and everything the
/// router has to say leaves through its `Transmit`. Interfaces and routes are fixed at
/// construction; the ARP cache is the only state that changes, and it is shared with the sweep
/// task started by `start_arp_sweep`.
pub struct Router {
    interfaces: InterfaceTable,
    routes: RoutingTable,
    cache: ArpCache,
    transmit: Arc<dyn Transmit>,
}

impl Router {
    pub fn new(
        interfaces: InterfaceTable,
        routes: RoutingTable,
        transmit: Arc<dyn Transmit>,
    ) -> Self {
        Router {
            interfaces,
            routes,
            cache: ArpCache::new(ArpConfig::default()),
            transmit,
        }
    }

    /// Replaces the ARP timing. Meant to be chained onto `new`, before any traffic is handled,
    /// since the cache starts over empty.
    pub fn arp_config(self, config: ArpConfig) -> Self {
        Router {
            cache: ArpCache::new(config),
            ..self
        }
    }

    pub fn interfaces(&self) -> &InterfaceTable {
        &self.interfaces
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn arp_cache(&self) -> &ArpCache {
        &self.cache
    }

    /// Processes one frame received on `interface`. Malformed or uninteresting frames are dropped
    /// without a trace on the wire; everything else results in replies, forwarded frames or ICMP
    /// errors handed to the transmit seam.
    #[instrument(level = "trace", skip(self, frame), fields(len = frame.len()))]
    pub fn handle_incoming(&self, frame: &[u8], interface: &str) {
        let iface = match self.interfaces.by_name(interface) {
            Some(iface) => iface,
            None => {
                warn!(interface, "frame on unknown interface");
                return;
            }
        };
        if let Err(err) = self.dispatch(frame, iface, Instant::now()) {
            debug!(%err, "dropped frame");
        }
    }

    /// One round of ARP maintenance at `now`. Called by the sweep task; exposed so the timing can
    /// be driven by hand.
    pub fn sweep_arp(&self, now: Instant) {
        let outcome = self.cache.sweep(now);

        for retransmit in outcome.retransmit {
            match self.interfaces.by_name(&retransmit.interface) {
                Some(egress) => {
                    debug!(
                        ip = %retransmit.ip,
                        interface = %egress.name,
                        "retransmitting ARP request"
                    );
                    self.send_arp_request(egress, retransmit.ip);
                }
                None => warn!(
                    interface = %retransmit.interface,
                    "ARP request for unknown interface"
                ),
            }
        }

        for request in outcome.failed {
            debug!(
                ip = %request.ip,
                queued = request.packets.len(),
                "giving up on ARP resolution"
            );
            for packet in request.packets {
                if let Err(err) = self.unreachable(&packet, request.ip) {
                    debug!(%err, "dropped queued packet");
                }
            }
        }
    }

    fn dispatch(&self, frame: &[u8], iface: &Interface, now: Instant) -> Result<(), RouterError> {
        let (ethernet, offset) = parse_ethernet(frame)?;
        match ethernet.ether_type {
            IPV4_ETHER_TYPE => self.handle_ipv4(frame, &ethernet, iface, now),
            ARP_ETHER_TYPE => self.handle_arp(&frame[offset..], &ethernet, iface, now),
            other => {
                trace!(ether_type = other, "ignoring ether type");
                Ok(())
            }
        }
    }

    fn handle_ipv4(
        &self,
        frame: &[u8],
        ethernet: &EthernetHeader,
        iface: &Interface,
        now: Instant,
    ) -> Result<(), RouterError> {
        let ip = Ipv4Header::parse(&frame[ETHERNET_HEADER_LEN..])?;
        let header_end = ETHERNET_HEADER_LEN + ip.header_len();
        if !header_checksum_valid(&frame[ETHERNET_HEADER_LEN..header_end]) {
            return Err(RouterError::BadChecksum);
        }
        // Anything past the total length is link layer padding.
        let frame = &frame[..ETHERNET_HEADER_LEN + usize::from(ip.total_len)];
        let datagram = &frame[ETHERNET_HEADER_LEN..];

        if self.interfaces.by_ip(ip.dest_addr).is_some() {
            self.deliver_local(datagram, ethernet, &ip, iface)
                .or_else(|err| self.answer(err, ethernet, iface, ip.dest_addr, datagram))
        } else {
            self.route(frame, ethernet, &ip, iface, now)
        }
    }

    /// Traffic for the router itself. Only echo requests are served.
    fn deliver_local(
        &self,
        datagram: &[u8],
        ethernet: &EthernetHeader,
        ip: &Ipv4Header,
        iface: &Interface,
    ) -> Result<(), RouterError> {
        if ip.protocol != IpProtocol::ICMP {
            return Err(RouterError::UnknownLocalProtocol(ip.protocol));
        }
        let message = &datagram[ip.header_len()..];
        let echo = IcmpEchoHeader::parse(message)?;
        if echo.icmp_type != ICMP_ECHO_REQUEST {
            return Err(RouterError::UnsupportedIcmpType(echo.icmp_type));
        }
        if !icmp_checksum_valid(message) {
            return Err(RouterError::BadChecksum);
        }

        let data = &message[ICMP_HEADER_LEN..];
        let reply = build_icmp_echo_reply_header(&echo, data);
        let header = build_ip_header(
            ip.dest_addr,
            ip.src_addr,
            IpProtocol::ICMP,
            ICMP_HEADER_LEN + data.len(),
        )?;

        let mut payload = Vec::with_capacity(IPV4_HEADER_LEN + ICMP_HEADER_LEN + data.len());
        payload.extend_from_slice(&header.to_bytes());
        payload.extend_from_slice(&reply.to_bytes());
        payload.extend_from_slice(data);

        trace!(to = %ip.src_addr, sequence = echo.sequence, "echo reply");
        let frame =
            EthernetHeader::new(ethernet.src_mac, iface.mac, IPV4_ETHER_TYPE).encap(&payload);
        self.send(&iface.name, &frame);
        Ok(())
    }

    /// Transit traffic: forwards the frame, or answers its source with the ICMP error explaining
    /// why it could not be.
    fn route(
        &self,
        frame: &[u8],
        ethernet: &EthernetHeader,
        ip: &Ipv4Header,
        arrival: &Interface,
        now: Instant,
    ) -> Result<(), RouterError> {
        self.forward(frame, ip, arrival, now).or_else(|err| {
            self.answer(
                err,
                ethernet,
                arrival,
                arrival.ip,
                &frame[ETHERNET_HEADER_LEN..],
            )
        })
    }

    fn forward(
        &self,
        frame: &[u8],
        ip: &Ipv4Header,
        arrival: &Interface,
        now: Instant,
    ) -> Result<(), RouterError> {
        // Expiry wins over a missing route.
        if ip.ttl <= 1 {
            return Err(RouterError::TtlExpired(ip.dest_addr));
        }
        let route = self
            .routes
            .longest_prefix_match(ip.dest_addr)
            .ok_or(RouterError::NoRoute(ip.dest_addr))?;
        let egress = self
            .interfaces
            .by_name(&route.interface)
            .ok_or_else(|| RouterError::UnknownInterface(route.interface.clone()))?;
        let next_hop = route.next_hop(ip.dest_addr);

        let mac = match self.cache.lookup(next_hop, now) {
            Some(mac) => mac,
            None => {
                let packet = QueuedPacket::new(frame.to_vec(), &arrival.name);
                match self.cache.enqueue(next_hop, &egress.name, packet, now) {
                    Enqueued::Resolved(mac) => mac,
                    Enqueued::Requested => {
                        debug!(ip = %next_hop, interface = %egress.name, "resolving next hop");
                        self.send_arp_request(egress, next_hop);
                        return Ok(());
                    }
                    Enqueued::Queued => {
                        trace!(ip = %next_hop, "queued behind pending ARP request");
                        return Ok(());
                    }
                }
            }
        };
        let out = rewrite(frame, ip, egress.mac, mac);
        trace!(to = %ip.dest_addr, via = %next_hop, interface = %egress.name, "forwarding");
        self.send(&egress.name, &out);
        Ok(())
    }

    /// Sends the ICMP error for `err` back over `iface`, the link the offending datagram came in
    /// on. Errors without an ICMP counterpart are handed back to the caller.
    fn answer(
        &self,
        err: RouterError,
        ethernet: &EthernetHeader,
        iface: &Interface,
        src_ip: Ipv4Addr,
        datagram: &[u8],
    ) -> Result<(), RouterError> {
        let kind = match err.icmp_error() {
            Some(kind) => kind,
            None => return Err(err),
        };
        debug!(%err, "answering with ICMP {:?}", kind);
        self.send_icmp_error(kind, ethernet, iface, src_ip, datagram);
        Ok(())
    }

    fn handle_arp(
        &self,
        payload: &[u8],
        ethernet: &EthernetHeader,
        iface: &Interface,
        now: Instant,
    ) -> Result<(), RouterError> {
        let arp = ArpHeader::parse(payload)?;
        if arp.target_ip != iface.ip {
            trace!(ip = %arp.target_ip, "ARP not for us");
            return Ok(());
        }

        match arp.opcode {
            ArpOp::Request => {
                let reply = build_arp_header(
                    ArpOp::Reply,
                    iface.mac,
                    iface.ip,
                    arp.sender_mac,
                    arp.sender_ip,
                );
                let frame = EthernetHeader::new(ethernet.src_mac, iface.mac, ARP_ETHER_TYPE)
                    .encap(&reply.to_bytes());
                trace!(to = %arp.sender_ip, "ARP reply");
                self.send(&iface.name, &frame);
            }
            ArpOp::Reply => {
                debug!(ip = %arp.sender_ip, mac = %arp.sender_mac, "ARP reply received");
            }
        }
        self.resolve(arp.sender_ip, arp.sender_mac, now);
        Ok(())
    }

    /// Learns `ip` at `mac` and forwards whatever was waiting for it.
    fn resolve(&self, ip: Ipv4Addr, mac: MacAddr, now: Instant) {
        for packet in self.cache.insert(ip, mac, now) {
            if let Err(err) = self.forward_queued(&packet, now) {
                debug!(%err, "dropped queued packet");
            }
        }
    }

    fn forward_queued(&self, packet: &QueuedPacket, now: Instant) -> Result<(), RouterError> {
        let arrival = self.arrival_interface(packet)?;
        let ethernet = EthernetHeader::parse(&packet.frame)?;
        let ip = Ipv4Header::parse(&packet.frame[ETHERNET_HEADER_LEN..])?;
        self.route(&packet.frame, &ethernet, &ip, arrival, now)
    }

    /// Host unreachable for a packet whose next hop never answered.
    fn unreachable(&self, packet: &QueuedPacket, next_hop: Ipv4Addr) -> Result<(), RouterError> {
        let arrival = self.arrival_interface(packet)?;
        let ethernet = EthernetHeader::parse(&packet.frame)?;
        self.answer(
            RouterError::ArpResolutionFailed(next_hop),
            &ethernet,
            arrival,
            arrival.ip,
            &packet.frame[ETHERNET_HEADER_LEN..],
        )
    }

    fn arrival_interface(&self, packet: &QueuedPacket) -> Result<&Interface, RouterError> {
        self.interfaces
            .by_name(&packet.arrival_interface)
            .ok_or_else(|| RouterError::UnknownInterface(packet.arrival_interface.clone()))
    }

    fn send_icmp_error(
        &self,
        kind: IcmpError,
        ethernet: &EthernetHeader,
        iface: &Interface,
        src_ip: Ipv4Addr,
        datagram: &[u8],
    ) {
        match icmp::error_frame(kind, ethernet, iface.mac, src_ip, datagram) {
            Some(frame) => self.send(&iface.name, &frame),
            None => trace!("ICMP error suppressed"),
        }
    }

    fn send_arp_request(&self, egress: &Interface, target: Ipv4Addr) {
        let request = build_arp_header(
            ArpOp::Request,
            egress.mac,
            egress.ip,
            MacAddr::ZERO,
            target,
        );
        let frame = EthernetHeader::new(MacAddr::BROADCAST, egress.mac, ARP_ETHER_TYPE)
            .encap(&request.to_bytes());
        self.send(&egress.name, &frame);
    }

    fn send(&self, interface: &str, frame: &[u8]) {
        if let Err(err) = self.transmit.transmit(interface, frame) {
            warn!(interface, %err, "transmit failed");
        }
    }
}

/// The forwarded copy of `frame`: new Ethernet addresses, one hop less to live and a fresh header
/// checksum. IP options are carried over as they are.
fn rewrite(frame: &[u8], ip: &Ipv4Header, src_mac: MacAddr, dest_mac: MacAddr) -> PacketData {
    let mut out = frame.to_vec();
    EthernetHeader::new(dest_mac, src_mac, IPV4_ETHER_TYPE).emit(&mut out);

    let mut header = *ip;
    header.ttl -= 1;
    let header_bytes = &mut out[ETHERNET_HEADER_LEN..ETHERNET_HEADER_LEN + ip.header_len()];
    header.emit(header_bytes);
    fill_header_checksum(header_bytes);
    out
}
