//! Error types for the gateway engine.
//!
//! All fallible operations return `Result<T, GatewayError>`. Every error is
//! fatal to the session it occurs in; nothing here triggers an in-protocol
//! retry. [`GatewayError::kind`] collapses the variants into the broad
//! failure taxonomy used by callers and tests.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::packet::PacketType;
use crate::state::SessionState;

/// Broad classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// I/O failure reading or writing the gateway transport.
    Transport,
    /// Malformed frame, truncated payload, or a packet that the current
    /// session state does not accept.
    Protocol,
    /// A verification hook rejected the step.
    Policy,
    /// Connect failure towards the target host, or relay I/O failure.
    Backend,
}

/// The canonical error type for the gateway engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Transport ────────────────────────────────────────────────
    /// The gateway transport failed mid-read or mid-write.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The peer went away without sending CLOSE_CHANNEL.
    #[error("transport closed unexpectedly")]
    Disconnected,

    /// The outbound packet queue was dropped before the write happened.
    #[error("outbound channel closed")]
    ChannelClosed,

    // ── Protocol ─────────────────────────────────────────────────
    /// Declared frame size outside the valid range.
    #[error("invalid frame size {size} (valid range 8..={max})")]
    InvalidFrameSize { size: usize, max: usize },

    /// A payload ended before a field it declared.
    #[error("truncated {message} payload: {needed} more bytes needed")]
    Truncated {
        message: &'static str,
        needed: usize,
    },

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u16 },

    /// A packet arrived in a state that does not accept it.
    #[error("{packet} not allowed in state {state}")]
    WrongState {
        packet: PacketType,
        state: SessionState,
    },

    // ── Policy ───────────────────────────────────────────────────
    /// A verification hook rejected the step.
    #[error("{subject} rejected by policy: {detail}")]
    Denied {
        subject: &'static str,
        detail: String,
    },

    // ── Backend ──────────────────────────────────────────────────
    /// Could not connect to the target host.
    #[error("backend connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The backend dial exceeded its deadline.
    #[error("backend connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Relaying bytes to the backend failed.
    #[error("backend relay error: {0}")]
    Relay(#[source] io::Error),
}

impl GatewayError {
    /// Classify this error into the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Transport(_)
            | GatewayError::Disconnected
            | GatewayError::ChannelClosed => ErrorKind::Transport,
            GatewayError::InvalidFrameSize { .. }
            | GatewayError::Truncated { .. }
            | GatewayError::UnknownVariant { .. }
            | GatewayError::WrongState { .. } => ErrorKind::Protocol,
            GatewayError::Denied { .. } => ErrorKind::Policy,
            GatewayError::Connect { .. }
            | GatewayError::ConnectTimeout { .. }
            | GatewayError::Relay(_) => ErrorKind::Backend,
        }
    }
}
