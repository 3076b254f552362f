use crossbeam::crossbeam_channel::{self, Receiver, Sender};
use sroute_packets::PacketData;
use std::io;

/// Hands a finished frame to the link layer for transmission on `interface`.
///
/// The frame is borrowed for the duration of the call only. Implementations must not block for
/// long: the router calls this from the packet path and from the ARP sweep.
pub trait Transmit: Send + Sync {
    fn transmit(&self, interface: &str, frame: &[u8]) -> io::Result<()>;
}

/// A frame on its way out, as produced by `ChannelTransmit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundFrame {
    pub interface: String,
    pub data: PacketData,
}

/// Transmit that pushes every frame into a crossbeam channel, for an I/O thread (or a test) to pick
/// up on the other end.
#[derive(Clone)]
pub struct ChannelTransmit {
    sender: Sender<OutboundFrame>,
}

impl ChannelTransmit {
    pub fn new(sender: Sender<OutboundFrame>) -> Self {
        ChannelTransmit { sender }
    }

    pub fn unbounded() -> (Self, Receiver<OutboundFrame>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelTransmit::new(sender), receiver)
    }
}

impl Transmit for ChannelTransmit {
    fn transmit(&self, interface: &str, frame: &[u8]) -> io::Result<()> {
        self.sender
            .send(OutboundFrame {
                interface: String::from(interface),
                data: frame.to_vec(),
            })
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "outbound channel closed"))
    }
}
