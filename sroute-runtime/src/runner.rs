use crate::arp::start_arp_sweep;
use crate::Router;
use crossbeam::crossbeam_channel::Receiver;
use sroute_packets::PacketData;
use std::io;
use std::sync::Arc;
use tokio::{runtime, task};

/// A frame as received from the link layer, tagged with the interface it arrived on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundFrame {
    pub interface: String,
    pub data: PacketData,
}

impl InboundFrame {
    pub fn new(interface: &str, data: PacketData) -> Self {
        InboundFrame {
            interface: String::from(interface),
            data,
        }
    }
}

/// Runs `router` until `input` disconnects.
///
/// Starts a tokio runtime, spawns the ARP sweep on it, and hands every frame from `input` to
/// `Router::handle_incoming` on a blocking task, in the order received. Once every sender of
/// `input` is gone and the channel has drained, the sweep is stopped and this returns.
///
/// In a production router the input never disconnects, so this never returns. Tests drop the
/// sender to let it finish.
pub fn run(router: Arc<Router>, input: Receiver<InboundFrame>) -> io::Result<()> {
    let mut runtime = runtime::Builder::new()
        .threaded_scheduler()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let _sweep = start_arp_sweep(Arc::clone(&router));

        let handler = task::spawn_blocking(move || {
            for frame in input.iter() {
                router.handle_incoming(&frame.data, &frame.interface);
            }
        });
        // 🏃💨💨
        handler
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    })
}
