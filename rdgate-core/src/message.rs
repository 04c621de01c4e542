//! Typed control messages and their wire layouts.
//!
//! Requests are decoded from client packet payloads; responses are encoded
//! into complete [`Packet`]s. All integer fields are little-endian.
//!
//! ```text
//! HANDSHAKE_REQUEST       major u8 | minor u8 | client_version u16 | extended_auth u16
//! HANDSHAKE_RESPONSE      error u32 | major u8 | minor u8 | server_version u16 | capabilities u16
//! TUNNEL_CREATE           caps u32 | fields u16 | reserved u16 [| cookie_len u16 | cookie utf16]
//! TUNNEL_RESPONSE         server_version u16 | error u32 | fields u16 | reserved u16 | tunnel_id u32 | caps u32
//! TUNNEL_AUTH             name_len u16 | name utf16
//! TUNNEL_AUTH_RESPONSE    error u32 | fields u16 | reserved u16 | redir_flags u32 | idle_timeout u32
//! CHANNEL_CREATE          resources u8 | alternative u8 | port u16 | protocol u16 | name_len u16 | name utf16
//! CHANNEL_RESPONSE        error u32 | fields u16 | reserved u16 | channel_id u32
//! ```

use crate::error::GatewayError;
use crate::packet::{Packet, PacketType};
use crate::strings::decode_utf16le;

// ── Wire constants ───────────────────────────────────────────────

/// Extended-auth capability: PAA token authentication.
pub const EXT_AUTH_PAA: u16 = 0x1;
/// Extended-auth capability: smart-card authentication.
pub const EXT_AUTH_SC: u16 = 0x2;

/// TUNNEL_CREATE fields-present bit: a PAA cookie follows.
pub const TUNNEL_FIELD_PAA_COOKIE: u16 = 0x1;

/// TUNNEL_RESPONSE fields-present bit: tunnel id.
pub const TUNNEL_RESPONSE_FIELD_TUNNEL_ID: u16 = 0x1;
/// TUNNEL_RESPONSE fields-present bit: capability flags.
pub const TUNNEL_RESPONSE_FIELD_CAPS: u16 = 0x2;

/// TUNNEL_AUTH_RESPONSE fields-present bit: redirection flags.
pub const TUNNEL_AUTH_RESPONSE_FIELD_REDIR_FLAGS: u16 = 0x1;
/// TUNNEL_AUTH_RESPONSE fields-present bit: idle timeout.
pub const TUNNEL_AUTH_RESPONSE_FIELD_IDLE_TIMEOUT: u16 = 0x2;

/// CHANNEL_RESPONSE fields-present bit: channel id.
pub const CHANNEL_RESPONSE_FIELD_CHANNEL_ID: u16 = 0x1;

/// Tunnel capability: idle-timeout negotiation.
pub const CAPABILITY_IDLE_TIMEOUT: u32 = 0x1;

/// Fixed tunnel identifier granted to every session.
pub const TUNNEL_ID: u32 = 10;
/// Fixed channel identifier. Windows clients require a non-zero value.
pub const CHANNEL_ID: u32 = 1;

// ── Field reader ─────────────────────────────────────────────────

/// Bounds-checked little-endian cursor over a packet payload.
struct Reader<'a> {
    data: &'a [u8],
    message: &'static str,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], message: &'static str) -> Self {
        Self { data, message }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], GatewayError> {
        if self.data.len() < n {
            return Err(GatewayError::Truncated {
                message: self.message,
                needed: n - self.data.len(),
            });
        }
        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, GatewayError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, GatewayError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, GatewayError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, n: usize) -> Result<(), GatewayError> {
        self.take(n).map(|_| ())
    }
}

// ── Handshake ────────────────────────────────────────────────────

/// Decoded HANDSHAKE_REQUEST payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub major: u8,
    pub minor: u8,
    pub client_version: u16,
    pub extended_auth: u16,
}

impl HandshakeRequest {
    pub fn decode(payload: &[u8]) -> Result<Self, GatewayError> {
        let mut r = Reader::new(payload, "HANDSHAKE_REQUEST");
        Ok(Self {
            major: r.u8()?,
            minor: r.u8()?,
            client_version: r.u16()?,
            extended_auth: r.u16()?,
        })
    }
}

/// HANDSHAKE_RESPONSE: echoes the client version and advertises the
/// extended-auth mechanisms this gateway accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    pub major: u8,
    pub minor: u8,
    pub capabilities: u16,
}

impl HandshakeResponse {
    /// Build the response for the configured auth mechanisms.
    pub fn new(major: u8, minor: u8, smart_card_auth: bool, token_auth: bool) -> Self {
        let mut capabilities = 0;
        if smart_card_auth {
            capabilities |= EXT_AUTH_SC;
        }
        if token_auth {
            capabilities |= EXT_AUTH_PAA;
        }
        Self {
            major,
            minor,
            capabilities,
        }
    }

    pub fn encode(&self) -> Packet {
        let mut buf = Vec::with_capacity(10);
        buf.extend_from_slice(&0u32.to_le_bytes()); // error code
        buf.push(self.major);
        buf.push(self.minor);
        buf.extend_from_slice(&0u16.to_le_bytes()); // server version
        buf.extend_from_slice(&self.capabilities.to_le_bytes());
        Packet::new(PacketType::HandshakeResponse, buf)
    }
}

// ── Tunnel create ────────────────────────────────────────────────

/// Decoded TUNNEL_CREATE payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelCreate {
    pub caps: u32,
    /// PAA cookie, when the fields-present bit announced one.
    pub paa_cookie: Option<String>,
}

impl TunnelCreate {
    pub fn decode(payload: &[u8]) -> Result<Self, GatewayError> {
        let mut r = Reader::new(payload, "TUNNEL_CREATE");
        let caps = r.u32()?;
        let fields = r.u16()?;
        r.skip(2)?; // reserved

        let paa_cookie = if fields & TUNNEL_FIELD_PAA_COOKIE != 0 {
            let size = r.u16()? as usize;
            Some(decode_utf16le(r.take(size)?))
        } else {
            None
        };

        Ok(Self { caps, paa_cookie })
    }
}

/// TUNNEL_RESPONSE: grants the tunnel with a fixed id and advertises
/// idle-timeout support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelResponse;

impl TunnelResponse {
    pub fn encode(&self) -> Packet {
        let mut buf = Vec::with_capacity(18);
        buf.extend_from_slice(&0u16.to_le_bytes()); // server version
        buf.extend_from_slice(&0u32.to_le_bytes()); // error code
        buf.extend_from_slice(
            &(TUNNEL_RESPONSE_FIELD_TUNNEL_ID | TUNNEL_RESPONSE_FIELD_CAPS).to_le_bytes(),
        );
        buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        buf.extend_from_slice(&TUNNEL_ID.to_le_bytes());
        buf.extend_from_slice(&CAPABILITY_IDLE_TIMEOUT.to_le_bytes());
        Packet::new(PacketType::TunnelResponse, buf)
    }
}

// ── Tunnel auth ──────────────────────────────────────────────────

/// Decoded TUNNEL_AUTH payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelAuth {
    pub client_name: String,
}

impl TunnelAuth {
    pub fn decode(payload: &[u8]) -> Result<Self, GatewayError> {
        let mut r = Reader::new(payload, "TUNNEL_AUTH");
        let size = r.u16()? as usize;
        Ok(Self {
            client_name: decode_utf16le(r.take(size)?),
        })
    }
}

/// TUNNEL_AUTH_RESPONSE: carries the redirection policy and the idle
/// timeout negotiated to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelAuthResponse {
    pub redirect_flags: u32,
    /// Minutes; already clamped to be non-negative.
    pub idle_timeout: u32,
}

impl TunnelAuthResponse {
    pub fn encode(&self) -> Packet {
        let mut buf = Vec::with_capacity(16);
        buf.extend_from_slice(&0u32.to_le_bytes()); // error code
        buf.extend_from_slice(
            &(TUNNEL_AUTH_RESPONSE_FIELD_REDIR_FLAGS | TUNNEL_AUTH_RESPONSE_FIELD_IDLE_TIMEOUT)
                .to_le_bytes(),
        );
        buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        buf.extend_from_slice(&self.redirect_flags.to_le_bytes());
        buf.extend_from_slice(&self.idle_timeout.to_le_bytes());
        Packet::new(PacketType::TunnelAuthResponse, buf)
    }
}

// ── Channel create ───────────────────────────────────────────────

/// Decoded CHANNEL_CREATE payload.
///
/// Only the first resource name is used; the alternative-host count and
/// protocol selector are read and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCreate {
    pub resource_count: u8,
    pub port: u16,
    pub server: String,
}

impl ChannelCreate {
    pub fn decode(payload: &[u8]) -> Result<Self, GatewayError> {
        let mut r = Reader::new(payload, "CHANNEL_CREATE");
        let resource_count = r.u8()?;
        let _alternative = r.u8()?;
        let port = r.u16()?;
        let _protocol = r.u16()?;
        let name_size = r.u16()? as usize;
        let server = decode_utf16le(r.take(name_size)?);
        Ok(Self {
            resource_count,
            port,
            server,
        })
    }

    /// The dialable `host:port` target, bracketing IPv6 literals.
    pub fn target_addr(&self) -> String {
        if self.server.contains(':') {
            format!("[{}]:{}", self.server, self.port)
        } else {
            format!("{}:{}", self.server, self.port)
        }
    }
}

/// CHANNEL_RESPONSE: grants the channel with the fixed non-zero id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelResponse;

impl ChannelResponse {
    pub fn encode(&self) -> Packet {
        let mut buf = Vec::with_capacity(12);
        buf.extend_from_slice(&0u32.to_le_bytes()); // error code
        buf.extend_from_slice(&CHANNEL_RESPONSE_FIELD_CHANNEL_ID.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        buf.extend_from_slice(&CHANNEL_ID.to_le_bytes());
        Packet::new(PacketType::ChannelResponse, buf)
    }
}

// ── Tests ────────────────────────────────────────────────────────
