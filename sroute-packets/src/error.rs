use thiserror::Error;

/// Reasons a buffer could not be read as the header it claims to contain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("{header} header needs {needed} bytes, buffer has {actual}")]
    TooShort {
        header: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("packet has IP version {0}, expected 4")]
    BadVersion(u8),

    #[error("IPv4 header length field {0} is below the minimum of 5 words")]
    BadHeaderLength(u8),

    #[error("IPv4 total length {total_len} does not fit header of {header_len} and buffer of {available} bytes")]
    BadTotalLength {
        total_len: usize,
        header_len: usize,
        available: usize,
    },

    #[error("unsupported ARP format: hardware {hardware_type:#06x}/{hardware_len}, protocol {protocol_type:#06x}/{protocol_len}")]
    UnsupportedArp {
        hardware_type: u16,
        protocol_type: u16,
        hardware_len: u8,
        protocol_len: u8,
    },

    #[error("{0} byte payload does not fit an IPv4 datagram")]
    PayloadTooLarge(usize),

    #[error("unknown ARP opcode {0}")]
    UnknownArpOp(u16),

    #[error("invalid MAC address {0:?}")]
    InvalidMacAddr(String),
}

pub(crate) fn ensure_len(
    header: &'static str,
    bytes: &[u8],
    needed: usize,
) -> Result<(), PacketError> {
    if bytes.len() < needed {
        return Err(PacketError::TooShort {
            header,
            needed,
            actual: bytes.len(),
        });
    }
    Ok(())
}
