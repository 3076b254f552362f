use crate::icmp::IcmpError;
use sroute_packets::{IpProtocol, PacketError};
use std::io;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Everything that can stop a frame from being handled normally.
///
/// None of these are fatal. Each one either makes the frame disappear silently or is answered with
/// an ICMP error towards whoever sent it; `icmp_error` tells which.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] PacketError),

    #[error("header checksum mismatch")]
    BadChecksum,

    #[error("unknown interface {0}")]
    UnknownInterface(String),

    #[error("no route to {0}")]
    NoRoute(Ipv4Addr),

    #[error("protocol {0:?} is not served by the router")]
    UnknownLocalProtocol(IpProtocol),

    #[error("ICMP type {0} is not served by the router")]
    UnsupportedIcmpType(u8),

    #[error("could not resolve the hardware address of {0}")]
    ArpResolutionFailed(Ipv4Addr),

    #[error("TTL expired in transit to {0}")]
    TtlExpired(Ipv4Addr),
}

impl RouterError {
    /// The ICMP error sent back to the source of the offending datagram, or `None` when the frame
    /// is dropped without a word.
    pub(crate) fn icmp_error(&self) -> Option<IcmpError> {
        match self {
            RouterError::NoRoute(_) => Some(IcmpError::NetUnreachable),
            RouterError::UnknownLocalProtocol(_) | RouterError::UnsupportedIcmpType(_) => {
                Some(IcmpError::PortUnreachable)
            }
            RouterError::ArpResolutionFailed(_) => Some(IcmpError::HostUnreachable),
            RouterError::TtlExpired(_) => Some(IcmpError::TtlExceeded),
            RouterError::MalformedFrame(_)
            | RouterError::BadChecksum
            | RouterError::UnknownInterface(_) => None,
        }
    }
}

/// Failures loading the static interface and routing tables.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
