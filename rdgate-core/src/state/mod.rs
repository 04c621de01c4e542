//! Session lifecycle state machine.
//!
//! ```text
//! Initial → Handshake → TunnelCreate → TunnelAuthorize → ChannelCreate → Opened → Closed
//! ```
//!
//! The order is strict and monotonic. Each control packet is accepted in
//! exactly one state; DATA and KEEPALIVE are accepted from `ChannelCreate`
//! onwards. Any other combination is a fatal protocol error.

use std::fmt;

use crate::error::GatewayError;
use crate::packet::PacketType;

/// The phase a gateway session is in.
///
/// `Ord` follows the handshake sequence, which is what makes the
/// "at least channel-create" predicate for bulk packets a plain
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SessionState {
    /// Transport established, nothing received yet.
    #[default]
    Initial,
    /// HANDSHAKE_REQUEST answered.
    Handshake,
    /// Tunnel granted.
    TunnelCreate,
    /// Tunnel authorized for the client.
    TunnelAuthorize,
    /// Channel granted and backend dialed; relay may start.
    ChannelCreate,
    /// Bulk data has flowed.
    Opened,
    /// Terminal; both transport halves are closed.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl SessionState {
    /// Guard for packets legal in exactly one state.
    pub fn require(
        self,
        expected: SessionState,
        packet: PacketType,
    ) -> Result<(), GatewayError> {
        if self == expected {
            Ok(())
        } else {
            Err(GatewayError::WrongState {
                packet,
                state: self,
            })
        }
    }

    /// Guard for packets legal in `floor` and every later state.
    pub fn require_at_least(
        self,
        floor: SessionState,
        packet: PacketType,
    ) -> Result<(), GatewayError> {
        if self >= floor {
            Ok(())
        } else {
            Err(GatewayError::WrongState {
                packet,
                state: self,
            })
        }
    }

    /// Whether the session has reached its terminal state.
    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

// ── Tests ────────────────────────────────────────────────────────
