use crate::error::ensure_len;
use crate::*;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_ECHO_REQUEST: u8 = 8;
pub const ICMP_TIME_EXCEEDED: u8 = 11;

/// Type, code, checksum plus the 4 bytes of identifier/sequence (echo) or unused (errors).
pub const ICMP_HEADER_LEN: usize = 8;
/// How much of the offending datagram an error message quotes: its IP header and the
/// first 8 bytes of its payload when the header has no options. The quote is fixed, so a
/// header carrying options leaves fewer than 8 payload bytes in it.
pub const ICMP_DATA_SIZE: usize = 28;
pub const ICMP_ERROR_LEN: usize = ICMP_HEADER_LEN + ICMP_DATA_SIZE;

/// Codes of the destination unreachable (type 3) family that the router emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IcmpUnreachable {
    Network = 0,
    Host = 1,
    Port = 3,
}

/// Returns whether the ICMP type is one of the error messages, which must never be
/// answered with another error.
pub fn is_error_type(icmp_type: u8) -> bool {
    match icmp_type {
        // Destination unreachable, source quench, redirect, time exceeded, parameter problem
        3 | 4 | 5 | 11 | 12 => true,
        _ => false,
    }
}

/// Validates the checksum of a complete ICMP message, header and data.
pub fn icmp_checksum_valid(message: &[u8]) -> bool {
    checksum(message) == 0
}

/// Header of an echo request or echo reply. The echo data follows it in the packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IcmpEchoHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl IcmpEchoHeader {
    pub fn parse(bytes: &[u8]) -> Result<IcmpEchoHeader, PacketError> {
        ensure_len("ICMP echo", bytes, ICMP_HEADER_LEN)?;
        Ok(IcmpEchoHeader {
            icmp_type: bytes[0],
            code: bytes[1],
            checksum: u16::from_be_bytes([bytes[2], bytes[3]]),
            identifier: u16::from_be_bytes([bytes[4], bytes[5]]),
            sequence: u16::from_be_bytes([bytes[6], bytes[7]]),
        })
    }

    /// # Panics
    /// If `buf` is shorter than `ICMP_HEADER_LEN`.
    pub fn emit(&self, buf: &mut [u8]) {
        buf[0] = self.icmp_type;
        buf[1] = self.code;
        buf[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_be_bytes());
    }

    pub fn to_bytes(&self) -> [u8; ICMP_HEADER_LEN] {
        let mut buf = [0; ICMP_HEADER_LEN];
        self.emit(&mut buf);
        buf
    }

    /// Recomputes the checksum over this header followed by `data`.
    pub fn fill_checksum(&mut self, data: &[u8]) {
        self.checksum = 0;
        let mut message = Vec::with_capacity(ICMP_HEADER_LEN + data.len());
        message.extend_from_slice(&self.to_bytes());
        message.extend_from_slice(data);
        self.checksum = checksum(&message);
    }
}

/// Turns an echo request header into the matching reply. The identifier and sequence
/// are kept and the checksum is computed over the reply header and the echoed `data`.
pub fn build_icmp_echo_reply_header(request: &IcmpEchoHeader, data: &[u8]) -> IcmpEchoHeader {
    let mut reply = IcmpEchoHeader {
        icmp_type: ICMP_ECHO_REPLY,
        code: 0,
        checksum: 0,
        identifier: request.identifier,
        sequence: request.sequence,
    };
    reply.fill_checksum(data);
    reply
}

/// An ICMP error message (destination unreachable, time exceeded) with the quoted
/// start of the datagram that caused it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IcmpErrorHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub unused: u16,
    pub next_mtu: u16,
    pub data: [u8; ICMP_DATA_SIZE],
}

impl IcmpErrorHeader {
    fn new(icmp_type: u8, code: u8, original: &[u8]) -> IcmpErrorHeader {
        let mut data = [0; ICMP_DATA_SIZE];
        let copied = original.len().min(ICMP_DATA_SIZE);
        data[..copied].copy_from_slice(&original[..copied]);

        let mut header = IcmpErrorHeader {
            icmp_type,
            code,
            checksum: 0,
            unused: 0,
            next_mtu: 0,
            data,
        };
        header.checksum = checksum(&header.to_bytes());
        header
    }

    pub fn parse(bytes: &[u8]) -> Result<IcmpErrorHeader, PacketError> {
        ensure_len("ICMP error", bytes, ICMP_ERROR_LEN)?;
        let mut data = [0; ICMP_DATA_SIZE];
        data.copy_from_slice(&bytes[ICMP_HEADER_LEN..ICMP_ERROR_LEN]);
        Ok(IcmpErrorHeader {
            icmp_type: bytes[0],
            code: bytes[1],
            checksum: u16::from_be_bytes([bytes[2], bytes[3]]),
            unused: u16::from_be_bytes([bytes[4], bytes[5]]),
            next_mtu: u16::from_be_bytes([bytes[6], bytes[7]]),
            data,
        })
    }

    /// # Panics
    /// If `buf` is shorter than `ICMP_ERROR_LEN`.
    pub fn emit(&self, buf: &mut [u8]) {
        buf[0] = self.icmp_type;
        buf[1] = self.code;
        buf[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[4..6].copy_from_slice(&self.unused.to_be_bytes());
        buf[6..8].copy_from_slice(&self.next_mtu.to_be_bytes());
        buf[ICMP_HEADER_LEN..ICMP_ERROR_LEN].copy_from_slice(&self.data);
    }

    pub fn to_bytes(&self) -> [u8; ICMP_ERROR_LEN] {
        let mut buf = [0; ICMP_ERROR_LEN];
        self.emit(&mut buf);
        buf
    }
}

/// Destination unreachable with the given `code`, quoting the first `ICMP_DATA_SIZE` bytes
/// of `original` (the offending datagram from its IP header on; shorter datagrams are zero
/// padded). Options in the quoted header count against those bytes.
pub fn build_icmp_type3_header(code: u8, original: &[u8]) -> IcmpErrorHeader {
    IcmpErrorHeader::new(ICMP_DEST_UNREACHABLE, code, original)
}

/// Time exceeded in transit (type 11, code 0), quoting `original`.
pub fn build_icmp_time_exceeded_header(original: &[u8]) -> IcmpErrorHeader {
    IcmpErrorHeader::new(ICMP_TIME_EXCEEDED, 0, original)
}
