//! Backend→client byte pump.

use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::network::PacketSink;
use crate::packet::{Packet, PacketType};

/// Read bounded chunks from the backend and emit them as DATA frames.
///
/// Runs until backend EOF, an I/O error, or cancellation. EOF and errors
/// cancel the session token so the engine tears the session down; the
/// client→backend direction stays on the engine task.
pub(crate) fn spawn_backend_pump(
    backend: OwnedReadHalf,
    sink: PacketSink,
    chunk_size: usize,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = pump(backend, sink, chunk_size) => {
                cancel.cancel();
            }
        }
    })
}

async fn pump(mut backend: OwnedReadHalf, sink: PacketSink, chunk_size: usize) {
    let mut buf = vec![0u8; chunk_size];
    loop {
        match backend.read(&mut buf).await {
            Ok(0) => {
                debug!("backend closed the connection");
                return;
            }
            Ok(n) => {
                let frame = Packet::new(PacketType::Data, buf[..n].to_vec());
                if sink.send(frame).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!("backend read error: {e}");
                return;
            }
        }
    }
}
