use crate::error::ensure_len;
use crate::*;
use std::convert::TryFrom;
use std::net::Ipv4Addr;

/// Length of an IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;
pub const DEFAULT_TTL: u8 = 64;

/// The fixed part of an IPv4 header. Options, if the sender included any, stay in the
/// packet buffer; `header_len()` tells how far they extend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    pub ihl: u8,
    pub tos: u8,
    pub total_len: u16,
    pub identification: u16,
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: IpProtocol,
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dest_addr: Ipv4Addr,
}

impl Ipv4Header {
    /// Reads the header at the start of `bytes`, which should begin at layer 3.
    ///
    /// Besides the length of the buffer, the version, IHL and total length fields are
    /// validated. The checksum is not; see `header_checksum_valid`.
    pub fn parse(bytes: &[u8]) -> Result<Ipv4Header, PacketError> {
        ensure_len("IPv4", bytes, IPV4_HEADER_LEN)?;

        let version = (bytes[0] & 0xF0) >> 4;
        if version != 4 {
            return Err(PacketError::BadVersion(version));
        }

        // This is the header length in 32bit words
        let ihl = bytes[0] & 0x0F;
        if ihl < 5 {
            return Err(PacketError::BadHeaderLength(ihl));
        }
        let header_len = usize::from(ihl) * 4;
        ensure_len("IPv4", bytes, header_len)?;

        let total_len = u16::from_be_bytes([bytes[2], bytes[3]]);
        if usize::from(total_len) < header_len || usize::from(total_len) > bytes.len() {
            return Err(PacketError::BadTotalLength {
                total_len: total_len.into(),
                header_len,
                available: bytes.len(),
            });
        }

        Ok(Ipv4Header {
            version,
            ihl,
            tos: bytes[1],
            total_len,
            identification: u16::from_be_bytes([bytes[4], bytes[5]]),
            flags_fragment: u16::from_be_bytes([bytes[6], bytes[7]]),
            ttl: bytes[8],
            protocol: IpProtocol::from(bytes[9]),
            checksum: u16::from_be_bytes([bytes[10], bytes[11]]),
            src_addr: Ipv4Addr::new(bytes[12], bytes[13], bytes[14], bytes[15]),
            dest_addr: Ipv4Addr::new(bytes[16], bytes[17], bytes[18], bytes[19]),
        })
    }

    pub fn header_len(&self) -> usize {
        usize::from(self.ihl) * 4
    }

    pub fn payload_len(&self) -> usize {
        usize::from(self.total_len) - self.header_len()
    }

    pub fn fragment_offset(&self) -> u16 {
        self.flags_fragment & 0x1FFF
    }

    /// Writes the 20 fixed header bytes into `buf`, leaving any option bytes that
    /// follow untouched. The checksum field is written as stored in `self`.
    ///
    /// # Panics
    /// If `buf` is shorter than `IPV4_HEADER_LEN`.
    pub fn emit(&self, buf: &mut [u8]) {
        buf[0] = (self.version << 4) | (self.ihl & 0x0F);
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&self.total_len.to_be_bytes());
        buf[4..6].copy_from_slice(&self.identification.to_be_bytes());
        buf[6..8].copy_from_slice(&self.flags_fragment.to_be_bytes());
        buf[8] = self.ttl;
        buf[9] = self.protocol.into();
        buf[10..12].copy_from_slice(&self.checksum.to_be_bytes());
        buf[12..16].copy_from_slice(&self.src_addr.octets());
        buf[16..20].copy_from_slice(&self.dest_addr.octets());
    }

    pub fn to_bytes(&self) -> [u8; IPV4_HEADER_LEN] {
        let mut buf = [0; IPV4_HEADER_LEN];
        self.emit(&mut buf);
        buf
    }
}

/// True when the checksum over the complete header (options included) comes out zero.
/// `header` must be exactly the header, `Ipv4Header::header_len()` bytes long.
pub fn header_checksum_valid(header: &[u8]) -> bool {
    checksum(header) == 0
}

/// Zeroes the checksum field of `header`, recomputes it over the whole slice and
/// stores the result in network byte order.
pub fn fill_header_checksum(header: &mut [u8]) {
    header[10..12].copy_from_slice(&[0, 0]);
    let sum = checksum(header);
    header[10..12].copy_from_slice(&sum.to_be_bytes());
}

/// A header for a new datagram originated by us: no options, no fragmentation,
/// TTL of 64 and a valid checksum. Fails if `payload_len` plus the header overflows the 16-bit
/// total length.
pub fn build_ip_header(
    src_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    protocol: IpProtocol,
    payload_len: usize,
) -> Result<Ipv4Header, PacketError> {
    let total_len = IPV4_HEADER_LEN
        .checked_add(payload_len)
        .and_then(|len| u16::try_from(len).ok())
        .ok_or(PacketError::PayloadTooLarge(payload_len))?;
    let mut header = Ipv4Header {
        version: 4,
        ihl: (IPV4_HEADER_LEN / 4) as u8,
        tos: 0,
        total_len,
        identification: 0,
        flags_fragment: 0,
        ttl: DEFAULT_TTL,
        protocol,
        checksum: 0,
        src_addr,
        dest_addr,
    };
    header.checksum = checksum(&header.to_bytes());
    Ok(header)
}
