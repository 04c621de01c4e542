//! Engine configuration.

use crate::flags::RedirectPolicy;
use crate::hooks::VerifyHooks;

/// Per-server settings consumed by the protocol engine.
///
/// Cheap to clone; the hooks are shared behind `Arc`.
#[derive(Debug, Clone)]
pub struct ServerConf {
    /// Verification hooks; absent hooks accept unconditionally.
    pub hooks: VerifyHooks,
    /// Device-redirection policy advertised to the client.
    pub redirect: RedirectPolicy,
    /// Idle timeout in minutes, negotiated to the client. Negative
    /// values are clamped to zero on encode.
    pub idle_timeout: i32,
    /// Advertise smart-card authentication support.
    pub smart_card_auth: bool,
    /// Advertise PAA token authentication support.
    pub token_auth: bool,
    /// Treat a rejected PAA cookie as fatal instead of advisory.
    pub enforce_paa_cookie: bool,
    /// Read-buffer capacity for the framed gateway transport.
    pub receive_buf: usize,
    /// Chunk size for backend reads relayed to the client as DATA frames.
    pub send_buf: usize,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            hooks: VerifyHooks::default(),
            redirect: RedirectPolicy::default(),
            idle_timeout: 0,
            smart_card_auth: false,
            token_auth: false,
            enforce_paa_cookie: false,
            receive_buf: 4096,
            send_buf: 4096,
        }
    }
}

impl ServerConf {
    /// The idle timeout as encoded on the wire.
    pub fn idle_timeout_minutes(&self) -> u32 {
        self.idle_timeout.max(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_idle_timeout_clamps_to_zero() {
        let conf = ServerConf {
            idle_timeout: -5,
            ..ServerConf::default()
        };
        assert_eq!(conf.idle_timeout_minutes(), 0);
    }

    #[test]
    fn non_negative_idle_timeout_unchanged() {
        for minutes in [0, 1, 30, i32::MAX] {
            let conf = ServerConf {
                idle_timeout: minutes,
                ..ServerConf::default()
            };
            assert_eq!(conf.idle_timeout_minutes(), minutes as u32);
        }
    }
}
