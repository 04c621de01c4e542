//! Frame codec for the gateway transport.
//!
//! Splits the inbound byte stream into [`Packet`]s on the 8-byte header
//! described in [`crate::packet`] and writes outbound packets as complete
//! frames. Plugs into `tokio_util::codec::Framed`.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::GatewayError;
use crate::packet::{Packet, HEADER_LENGTH, MAX_PACKET_SIZE};

/// Stateless codec: one [`Packet`] per wire frame.
#[derive(Debug, Default)]
pub struct GatewayCodec;

impl Decoder for GatewayCodec {
    type Item = Packet;
    type Error = GatewayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, GatewayError> {
        if src.len() < HEADER_LENGTH {
            return Ok(None);
        }

        let type_code = u16::from_le_bytes([src[0], src[1]]);
        let size = u16::from_le_bytes([src[2], src[3]]) as usize;
        if !(HEADER_LENGTH..=MAX_PACKET_SIZE).contains(&size) {
            return Err(GatewayError::InvalidFrameSize {
                size,
                max: MAX_PACKET_SIZE,
            });
        }

        if src.len() < size {
            src.reserve(size - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(size);
        // type, size and the reserved field are consumed with the header
        frame.advance(HEADER_LENGTH);
        Ok(Some(Packet::from_wire(type_code, frame.to_vec())))
    }
}

impl Encoder<Packet> for GatewayCodec {
    type Error = GatewayError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), GatewayError> {
        let size = item.total_size();
        if size > MAX_PACKET_SIZE {
            return Err(GatewayError::InvalidFrameSize {
                size,
                max: MAX_PACKET_SIZE,
            });
        }
        dst.extend_from_slice(&item.to_bytes());
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
