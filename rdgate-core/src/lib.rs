//! Core protocol engine for a Remote Desktop Gateway tunnel endpoint.
//!
//! Terminates the RDG control protocol on any full-duplex byte stream:
//! frames packets, walks the five-phase handshake, invokes the configured
//! verification hooks, dials the requested backend, and relays opaque RDP
//! traffic until either side closes.
//!
//! Layering, leaves first:
//!
//! 1. [`codec`] — length-prefixed frame codec over the 8-byte header.
//! 2. [`strings`] — UTF-16LE handling for client-supplied fields.
//! 3. [`message`] — typed control messages and their wire layouts.
//! 4. [`network`] — framed transport with a single outbound writer task.
//! 5. [`protocol`] — the handshake state machine and relay handover.
//!
//! Transport upgrade (HTTP, TLS, WebSocket), cookie minting, and process
//! lifecycle live outside this crate; the engine is handed an established
//! stream and a [`ServerConf`].

pub mod codec;
pub mod config;
pub mod error;
pub mod flags;
pub mod hooks;
pub mod message;
pub mod network;
pub mod packet;
pub mod protocol;
pub mod state;
pub mod strings;

pub use codec::GatewayCodec;
pub use config::ServerConf;
pub use error::{ErrorKind, GatewayError};
pub use flags::RedirectPolicy;
pub use hooks::{VerifyHook, VerifyHooks};
pub use network::{PacketSink, SessionTransport};
pub use packet::{Packet, PacketType, HEADER_LENGTH, MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE};
pub use protocol::{Server, DIAL_TIMEOUT};
pub use state::SessionState;
