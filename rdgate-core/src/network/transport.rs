//! Framed gateway transport with a single writer task.
//!
//! Inbound packets are read serially by the engine. Outbound packets may
//! come from the engine or from the backend pump, so whole-packet writes
//! are serialized through one mpsc channel into a writer task that owns
//! the sink half. No mutex, no interleaved frames.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::codec::GatewayCodec;
use crate::error::GatewayError;
use crate::packet::Packet;

/// Outbound queue depth before senders back-pressure.
const OUTBOUND_QUEUE: usize = 128;

/// Cloneable handle used to enqueue packets for the writer task.
#[derive(Clone, Debug)]
pub struct PacketSink {
    tx: mpsc::Sender<Packet>,
}

impl PacketSink {
    /// Enqueue one packet for transmission.
    pub async fn send(&self, packet: Packet) -> Result<(), GatewayError> {
        self.tx
            .send(packet)
            .await
            .map_err(|_| GatewayError::ChannelClosed)
    }
}

/// A full-duplex gateway transport framed with [`GatewayCodec`].
pub struct SessionTransport<T> {
    reader: SplitStream<Framed<T, GatewayCodec>>,
    sink: Option<PacketSink>,
    cancel: CancellationToken,
    writer: Option<JoinHandle<()>>,
}

impl<T> SessionTransport<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Frame `stream` and start the writer task.
    pub fn new(stream: T) -> Self {
        Self::with_capacity(stream, 4096)
    }

    /// Frame `stream` with an explicit read-buffer capacity.
    pub fn with_capacity(stream: T, read_buf: usize) -> Self {
        let framed = Framed::with_capacity(stream, GatewayCodec, read_buf.max(1));
        let (sink_half, reader) = framed.split();
        let (tx, rx) = mpsc::channel::<Packet>(OUTBOUND_QUEUE);
        let cancel = CancellationToken::new();
        let writer = tokio::spawn(write_loop(sink_half, rx, cancel.clone()));

        Self {
            reader,
            sink: Some(PacketSink { tx }),
            cancel,
            writer: Some(writer),
        }
    }

    /// Read the next packet.
    ///
    /// `Ok(None)` means the peer closed the stream cleanly at a frame
    /// boundary; an EOF mid-frame surfaces as a transport error.
    pub async fn read_message(&mut self) -> Result<Option<Packet>, GatewayError> {
        match self.reader.next().await {
            Some(Ok(packet)) => Ok(Some(packet)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Enqueue a packet through the writer task.
    pub async fn send(&self, packet: Packet) -> Result<(), GatewayError> {
        match &self.sink {
            Some(sink) => sink.send(packet).await,
            None => Err(GatewayError::ChannelClosed),
        }
    }

    /// A cloneable outbound handle, or `None` once the transport closed.
    pub fn sink(&self) -> Option<PacketSink> {
        self.sink.clone()
    }

    /// Drain queued packets, then shut the write side down.
    ///
    /// Waits for every [`PacketSink`] clone to drop before the writer
    /// exits, so stop any task still holding one first.
    pub async fn close(&mut self) {
        self.sink.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.await;
        }
    }

    /// Stop the writer immediately; queued packets are dropped.
    pub async fn abort(&mut self) {
        self.cancel.cancel();
        self.sink.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.await;
        }
    }
}

async fn write_loop<T>(
    mut sink: SplitSink<Framed<T, GatewayCodec>, Packet>,
    mut rx: mpsc::Receiver<Packet>,
    cancel: CancellationToken,
) where
    T: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            maybe = rx.recv() => match maybe {
                Some(packet) => {
                    if let Err(e) = sink.send(packet).await {
                        debug!("transport write error: {e}");
                        break;
                    }
                }
                None => break,
            },
        }
    }
    let _ = sink.close().await;
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{PacketType, HEADER_LENGTH};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn send_produces_a_complete_frame() {
        let (server_io, mut client_io) = duplex(1024);
        let mut transport = SessionTransport::new(server_io);

        transport
            .send(Packet::new(PacketType::Data, b"ping".to_vec()))
            .await
            .unwrap();

        let mut frame = vec![0u8; HEADER_LENGTH + 4];
        client_io.read_exact(&mut frame).await.unwrap();
        assert_eq!(u16::from_le_bytes([frame[0], frame[1]]), 0x000A);
        assert_eq!(u16::from_le_bytes([frame[2], frame[3]]), 12);
        assert_eq!(&frame[8..], b"ping");

        transport.close().await;
    }

    #[tokio::test]
    async fn read_message_decodes_inbound_frames() {
        let (server_io, mut client_io) = duplex(1024);
        let mut transport = SessionTransport::new(server_io);

        let frame = Packet::new(PacketType::Keepalive, Vec::new()).to_bytes();
        client_io.write_all(&frame).await.unwrap();

        let pkt = transport.read_message().await.unwrap().unwrap();
        assert_eq!(pkt.type_code(), PacketType::Keepalive as u16);

        // clean EOF at a frame boundary
        drop(client_io);
        assert!(transport.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_mid_frame_is_a_transport_error() {
        let (server_io, mut client_io) = duplex(1024);
        let mut transport = SessionTransport::new(server_io);

        // header promises 16 bytes but only 10 arrive
        client_io
            .write_all(&[0x0A, 0x00, 0x10, 0x00, 0, 0, 0, 0, 1, 2])
            .await
            .unwrap();
        drop(client_io);

        let err = transport.read_message().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    }

    #[tokio::test]
    async fn concurrent_senders_never_interleave_frames() {
        let (server_io, mut client_io) = duplex(64 * 1024);
        let mut transport = SessionTransport::new(server_io);

        let a = transport.sink().unwrap();
        let b = transport.sink().unwrap();
        let task_a = tokio::spawn(async move {
            for _ in 0..50 {
                a.send(Packet::new(PacketType::Data, vec![0xAA; 100]))
                    .await
                    .unwrap();
            }
        });
        let task_b = tokio::spawn(async move {
            for _ in 0..50 {
                b.send(Packet::new(PacketType::Data, vec![0xBB; 200]))
                    .await
                    .unwrap();
            }
        });
        task_a.await.unwrap();
        task_b.await.unwrap();

        // every frame must parse and its payload must be uniform
        for _ in 0..100 {
            let mut header = [0u8; HEADER_LENGTH];
            client_io.read_exact(&mut header).await.unwrap();
            let size = u16::from_le_bytes([header[2], header[3]]) as usize;
            let mut payload = vec![0u8; size - HEADER_LENGTH];
            client_io.read_exact(&mut payload).await.unwrap();
            assert!(payload.iter().all(|&b| b == payload[0]));
        }

        transport.close().await;
    }

    #[tokio::test]
    async fn close_drains_queued_packets() {
        let (server_io, mut client_io) = duplex(1024);
        let mut transport = SessionTransport::new(server_io);

        transport
            .send(Packet::new(PacketType::Data, b"last".to_vec()))
            .await
            .unwrap();
        transport.close().await;

        let mut frame = vec![0u8; HEADER_LENGTH + 4];
        client_io.read_exact(&mut frame).await.unwrap();
        assert_eq!(&frame[8..], b"last");

        // write side is shut down afterwards
        let mut rest = Vec::new();
        client_io.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (server_io, _client_io) = duplex(1024);
        let mut transport = SessionTransport::new(server_io);
        transport.close().await;

        let err = transport
            .send(Packet::new(PacketType::Keepalive, Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ChannelClosed));
        assert!(transport.sink().is_none());
    }
}
