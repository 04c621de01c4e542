//! Control-plane packet framing.
//!
//! Every frame on the wire starts with an 8-byte header, all fields
//! little-endian:
//!
//! ```text
//! offset 0: u16  packet_type
//! offset 2: u16  packet_size   (total frame size, header included)
//! offset 4: u32  reserved      (written as zero, ignored on read)
//! offset 8: payload            (packet_size - 8 bytes)
//! ```

use std::fmt;

use crate::error::GatewayError;

/// Size of the fixed frame header.
pub const HEADER_LENGTH: usize = 8;

/// Largest frame accepted on the wire, header included.
pub const MAX_PACKET_SIZE: usize = 65535;

/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_LENGTH;

// ── PacketType ───────────────────────────────────────────────────

/// Control packet type codes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Client opens the protocol and announces its version.
    HandshakeRequest = 0x0001,
    /// Server echo of the version plus extended-auth capabilities.
    HandshakeResponse = 0x0002,
    /// Client requests a tunnel, optionally carrying a PAA cookie.
    TunnelCreate = 0x0003,
    /// Server grants the tunnel.
    TunnelResponse = 0x0004,
    /// Client authorizes the tunnel with its machine name.
    TunnelAuth = 0x0005,
    /// Server reply with redirection flags and idle timeout.
    TunnelAuthResponse = 0x0006,
    /// Client names the target host and port.
    ChannelCreate = 0x0007,
    /// Server grants the channel.
    ChannelResponse = 0x0008,
    /// Opaque bulk bytes relayed between client and backend.
    Data = 0x000A,
    /// Client liveness signal; never echoed.
    Keepalive = 0x000B,
    /// Client tears the channel down.
    CloseChannel = 0x0010,
}

impl TryFrom<u16> for PacketType {
    type Error = GatewayError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(PacketType::HandshakeRequest),
            0x0002 => Ok(PacketType::HandshakeResponse),
            0x0003 => Ok(PacketType::TunnelCreate),
            0x0004 => Ok(PacketType::TunnelResponse),
            0x0005 => Ok(PacketType::TunnelAuth),
            0x0006 => Ok(PacketType::TunnelAuthResponse),
            0x0007 => Ok(PacketType::ChannelCreate),
            0x0008 => Ok(PacketType::ChannelResponse),
            0x000A => Ok(PacketType::Data),
            0x000B => Ok(PacketType::Keepalive),
            0x0010 => Ok(PacketType::CloseChannel),
            _ => Err(GatewayError::UnknownVariant {
                type_name: "PacketType",
                value,
            }),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── Packet ───────────────────────────────────────────────────────

/// A single control-plane frame: a raw type code plus opaque payload.
///
/// The type code stays raw (`u16`) so frames with unknown types survive
/// the codec and reach the engine, which logs and skips them instead of
/// dropping the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    type_code: u16,
    payload: Vec<u8>,
}

impl Packet {
    /// Build a packet of a known type.
    pub fn new(packet_type: PacketType, payload: Vec<u8>) -> Self {
        Self {
            type_code: packet_type as u16,
            payload,
        }
    }

    /// Build a packet from a raw type code read off the wire.
    pub fn from_wire(type_code: u16, payload: Vec<u8>) -> Self {
        Self { type_code, payload }
    }

    /// The raw 16-bit type code.
    pub fn type_code(&self) -> u16 {
        self.type_code
    }

    /// The type code resolved against the known packet types.
    pub fn packet_type(&self) -> Result<PacketType, GatewayError> {
        PacketType::try_from(self.type_code)
    }

    /// The payload bytes, header excluded.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the packet, yielding its payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Total on-wire size of this frame, header included.
    pub fn total_size(&self) -> usize {
        HEADER_LENGTH + self.payload.len()
    }

    /// Serialize to a complete wire frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.total_size());
        frame.extend_from_slice(&self.type_code.to_le_bytes());
        frame.extend_from_slice(&(self.total_size() as u16).to_le_bytes());
        frame.extend_from_slice(&0u32.to_le_bytes());
        frame.extend_from_slice(&self.payload);
        frame
    }
}

// ── Tests ────────────────────────────────────────────────────────
