//! Device-redirection policy and its wire bitmask.

use serde::{Deserialize, Serialize};

/// Redirection flag: every device class is permitted.
pub const REDIRECT_ENABLE_ALL: u32 = 0x8000_0000;
/// Redirection flag: every device class is forbidden.
pub const REDIRECT_DISABLE_ALL: u32 = 0x4000_0000;
/// Per-feature disable bits.
pub const REDIRECT_DISABLE_DRIVE: u32 = 0x1;
pub const REDIRECT_DISABLE_PRINTER: u32 = 0x2;
pub const REDIRECT_DISABLE_PORT: u32 = 0x4;
pub const REDIRECT_DISABLE_CLIPBOARD: u32 = 0x8;
pub const REDIRECT_DISABLE_PNP: u32 = 0x10;

/// Which device-redirection features the gateway permits.
///
/// `disable_all` wins over `enable_all`; when neither is set, every
/// feature left at `false` contributes its disable bit to the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectPolicy {
    pub disable_all: bool,
    pub enable_all: bool,
    pub port: bool,
    pub clipboard: bool,
    pub drive: bool,
    pub pnp: bool,
    pub printer: bool,
}

impl RedirectPolicy {
    /// Policy that permits every device class.
    pub fn allow_all() -> Self {
        Self {
            enable_all: true,
            ..Self::default()
        }
    }

    /// Policy that forbids every device class.
    pub fn deny_all() -> Self {
        Self {
            disable_all: true,
            ..Self::default()
        }
    }

    /// Collapse the policy into the TUNNEL_AUTH_RESPONSE bitmask.
    pub fn to_flags(&self) -> u32 {
        if self.disable_all {
            return REDIRECT_DISABLE_ALL;
        }
        if self.enable_all {
            return REDIRECT_ENABLE_ALL;
        }

        let mut flags = 0;
        if !self.port {
            flags |= REDIRECT_DISABLE_PORT;
        }
        if !self.clipboard {
            flags |= REDIRECT_DISABLE_CLIPBOARD;
        }
        if !self.drive {
            flags |= REDIRECT_DISABLE_DRIVE;
        }
        if !self.pnp {
            flags |= REDIRECT_DISABLE_PNP;
        }
        if !self.printer {
            flags |= REDIRECT_DISABLE_PRINTER;
        }
        flags
    }
}

// ── Tests ────────────────────────────────────────────────────────
