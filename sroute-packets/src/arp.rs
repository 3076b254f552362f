use crate::error::ensure_len;
use crate::*;
use std::convert::TryFrom;
use std::net::Ipv4Addr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

impl TryFrom<u16> for ArpOp {
    type Error = PacketError;

    fn try_from(opcode: u16) -> Result<Self, Self::Error> {
        match opcode {
            1 => Ok(ArpOp::Request),
            2 => Ok(ArpOp::Reply),
            other => Err(PacketError::UnknownArpOp(other)),
        }
    }
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

/// Size of an ARP packet resolving IPv4 addresses to Ethernet addresses.
pub const ARP_HEADER_LEN: usize = 28;

const HARDWARE_ADDR_LEN: u8 = 6;
const PROTOCOL_ADDR_LEN: u8 = 4;

///
/// ARP packet as described in RFC 826 (https://tools.ietf.org/html/rfc826), restricted to
/// Ethernet hardware addresses and IPv4 protocol addresses.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArpHeader {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hardware_addr_len: u8,
    pub protocol_addr_len: u8,
    pub opcode: ArpOp,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpHeader {
    ///
    /// Reads an ARP packet from the Ethernet payload `bytes`.
    /// Validates
    /// - The payload is long enough for an Ethernet/IPv4 ARP packet
    /// - The hardware/protocol types and address lengths are Ethernet/IPv4
    /// - The opcode is a request or a reply
    ///
    pub fn parse(bytes: &[u8]) -> Result<ArpHeader, PacketError> {
        ensure_len("ARP", bytes, ARP_HEADER_LEN)?;

        let hardware_type = u16::from_be_bytes([bytes[0], bytes[1]]);
        let protocol_type = u16::from_be_bytes([bytes[2], bytes[3]]);
        let hardware_addr_len = bytes[4];
        let protocol_addr_len = bytes[5];
        if hardware_type != ArpHardwareType::Ethernet as u16
            || protocol_type != IPV4_ETHER_TYPE
            || hardware_addr_len != HARDWARE_ADDR_LEN
            || protocol_addr_len != PROTOCOL_ADDR_LEN
        {
            return Err(PacketError::UnsupportedArp {
                hardware_type,
                protocol_type,
                hardware_len: hardware_addr_len,
                protocol_len: protocol_addr_len,
            });
        }

        Ok(ArpHeader {
            hardware_type,
            protocol_type,
            hardware_addr_len,
            protocol_addr_len,
            opcode: ArpOp::try_from(u16::from_be_bytes([bytes[6], bytes[7]]))?,
            sender_mac: MacAddr::from_slice(&bytes[8..14]),
            sender_ip: Ipv4Addr::new(bytes[14], bytes[15], bytes[16], bytes[17]),
            target_mac: MacAddr::from_slice(&bytes[18..24]),
            target_ip: Ipv4Addr::new(bytes[24], bytes[25], bytes[26], bytes[27]),
        })
    }

    /// # Panics
    /// If `buf` is shorter than `ARP_HEADER_LEN`.
    pub fn emit(&self, buf: &mut [u8]) {
        buf[0..2].copy_from_slice(&self.hardware_type.to_be_bytes());
        buf[2..4].copy_from_slice(&self.protocol_type.to_be_bytes());
        buf[4] = self.hardware_addr_len;
        buf[5] = self.protocol_addr_len;
        buf[6..8].copy_from_slice(&(self.opcode as u16).to_be_bytes());
        buf[8..14].copy_from_slice(&self.sender_mac.bytes);
        buf[14..18].copy_from_slice(&self.sender_ip.octets());
        buf[18..24].copy_from_slice(&self.target_mac.bytes);
        buf[24..28].copy_from_slice(&self.target_ip.octets());
    }

    pub fn to_bytes(&self) -> [u8; ARP_HEADER_LEN] {
        let mut buf = [0; ARP_HEADER_LEN];
        self.emit(&mut buf);
        buf
    }
}

/// An Ethernet/IPv4 ARP packet with the given operation and addresses.
pub fn build_arp_header(
    opcode: ArpOp,
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
) -> ArpHeader {
    ArpHeader {
        hardware_type: ArpHardwareType::Ethernet as u16,
        protocol_type: IPV4_ETHER_TYPE,
        hardware_addr_len: HARDWARE_ADDR_LEN,
        protocol_addr_len: PROTOCOL_ADDR_LEN,
        opcode,
        sender_mac,
        sender_ip,
        target_mac,
        target_ip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arp_frame_from_ethernet() -> Result<(), PacketError> {
        let arp_payload: Vec<u8> = vec![
            0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01, 1, 2, 3, 4, 5, 6, 10, 0, 0, 1, 10, 9,
            8, 7, 6, 5, 0xff, 0xff, 0xff, 0xff,
        ];
        let frame = EthernetHeader::new(MacAddr::BROADCAST, MacAddr::ZERO, ARP_ETHER_TYPE)
            .encap(&arp_payload);
        let (ethernet, offset) = parse_ethernet(&frame)?;
        assert_eq!(ethernet.ether_type, ARP_ETHER_TYPE);

        let arp = ArpHeader::parse(&frame[offset..])?;
        assert_eq!(arp.hardware_type, 1);
        assert_eq!(arp.protocol_type, IPV4_ETHER_TYPE);
        assert_eq!(arp.hardware_addr_len, 6);
        assert_eq!(arp.protocol_addr_len, 4);
        assert_eq!(arp.opcode, ArpOp::Request);
        assert_eq!(arp.sender_mac, MacAddr::new([1, 2, 3, 4, 5, 6]));
        assert_eq!(arp.sender_ip, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(arp.target_mac, MacAddr::new([10, 9, 8, 7, 6, 5]));
        assert_eq!(arp.target_ip, Ipv4Addr::BROADCAST);
        assert_eq!(&arp.to_bytes()[..], &arp_payload[..]);
        Ok(())
    }

    #[test]
    fn too_short() {
        assert_eq!(
            ArpHeader::parse(&[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]),
            Err(PacketError::TooShort {
                header: "ARP",
                needed: 28,
                actual: 8
            })
        );
    }

    #[test]
    fn rejects_non_ipv4() {
        let mut payload = build_arp_header(
            ArpOp::Request,
            MacAddr::ZERO,
            Ipv4Addr::UNSPECIFIED,
            MacAddr::ZERO,
            Ipv4Addr::UNSPECIFIED,
        )
        .to_bytes();
        payload[2..4].copy_from_slice(&0x86ddu16.to_be_bytes());
        assert_eq!(
            ArpHeader::parse(&payload),
            Err(PacketError::UnsupportedArp {
                hardware_type: 1,
                protocol_type: 0x86dd,
                hardware_len: 6,
                protocol_len: 4
            })
        );
    }

    #[test]
    fn rejects_unknown_opcode() {
        let mut payload = build_arp_header(
            ArpOp::Reply,
            MacAddr::ZERO,
            Ipv4Addr::UNSPECIFIED,
            MacAddr::ZERO,
            Ipv4Addr::UNSPECIFIED,
        )
        .to_bytes();
        payload[7] = 9;
        assert_eq!(ArpHeader::parse(&payload), Err(PacketError::UnknownArpOp(9)));
    }

    #[test]
    fn build_reply() {
        let arp = build_arp_header(
            ArpOp::Reply,
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            Ipv4Addr::new(10, 0, 0, 1),
            MacAddr::new([6, 5, 4, 3, 2, 1]),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        let bytes = arp.to_bytes();
        assert_eq!(&bytes[..8], &[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x02]);
        assert_eq!(ArpHeader::parse(&bytes), Ok(arp));
    }
}
