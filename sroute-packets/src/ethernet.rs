use crate::error::ensure_len;
use crate::*;

// Ethernet II frames must be at least the header, which is 14bytes
// 0                    6                    12                      14
// |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType---|
pub const ETHERNET_HEADER_LEN: usize = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dest_mac: MacAddr,
    pub src_mac: MacAddr,
    pub ether_type: u16,
}

impl EthernetHeader {
    pub fn new(dest_mac: MacAddr, src_mac: MacAddr, ether_type: u16) -> EthernetHeader {
        EthernetHeader {
            dest_mac,
            src_mac,
            ether_type,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<EthernetHeader, PacketError> {
        ensure_len("Ethernet", bytes, ETHERNET_HEADER_LEN)?;
        Ok(EthernetHeader {
            dest_mac: MacAddr::from_slice(&bytes[0..6]),
            src_mac: MacAddr::from_slice(&bytes[6..12]),
            ether_type: u16::from_be_bytes([bytes[12], bytes[13]]),
        })
    }

    /// Writes the header into the first 14 bytes of `buf`.
    ///
    /// # Panics
    /// If `buf` is shorter than `ETHERNET_HEADER_LEN`.
    pub fn emit(&self, buf: &mut [u8]) {
        buf[0..6].copy_from_slice(&self.dest_mac.bytes);
        buf[6..12].copy_from_slice(&self.src_mac.bytes);
        buf[12..14].copy_from_slice(&self.ether_type.to_be_bytes());
    }

    /// Builds a complete frame: this header followed by `payload`.
    pub fn encap(&self, payload: &[u8]) -> PacketData {
        let mut frame = vec![0; ETHERNET_HEADER_LEN + payload.len()];
        self.emit(&mut frame);
        frame[ETHERNET_HEADER_LEN..].copy_from_slice(payload);
        frame
    }
}

/// Reads the Ethernet header at the start of `bytes`, returning it together with the
/// offset of the payload.
pub fn parse_ethernet(bytes: &[u8]) -> Result<(EthernetHeader, usize), PacketError> {
    let header = EthernetHeader::parse(bytes)?;
    Ok((header, ETHERNET_HEADER_LEN))
}
