//! Gateway daemon configuration.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rdgate_core::{RedirectPolicy, ServerConf, VerifyHook, VerifyHooks};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Tunnel negotiation settings.
    pub tunnel: TunnelConfig,
    /// Device-redirection policy advertised to clients.
    pub redirect: RedirectPolicy,
    /// Access policy turned into verification hooks.
    pub policy: PolicyConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to accept gateway connections on.
    pub listen: String,
    /// Read-buffer capacity for each client transport.
    pub receive_buf: usize,
    /// Chunk size for backend reads relayed to clients.
    pub send_buf: usize,
}

/// Tunnel negotiation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Idle timeout in minutes negotiated to the client; 0 disables it.
    pub idle_timeout_minutes: i32,
    /// Advertise smart-card authentication.
    pub smart_card_auth: bool,
    /// Advertise PAA token authentication.
    pub token_auth: bool,
    /// Refuse the tunnel when the PAA cookie is rejected instead of
    /// only logging it.
    pub enforce_paa_cookie: bool,
}

/// Access policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Exact `host:port` targets clients may reach. Empty = any.
    pub allowed_targets: Vec<String>,
    /// Client machine names allowed to authorize. Empty = any.
    pub allowed_clients: Vec<String>,
    /// Static PAA secret a cookie must match. Empty = no check.
    pub paa_secret: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            tunnel: TunnelConfig::default(),
            redirect: RedirectPolicy::allow_all(),
            policy: PolicyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:4443".into(),
            receive_buf: 4096,
            send_buf: 4096,
        }
    }
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 0,
            smart_card_auth: false,
            token_auth: false,
            enforce_paa_cookie: false,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_targets: Vec::new(),
            allowed_clients: Vec::new(),
            paa_secret: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl GatewayConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Build the engine configuration, turning the access policy into
    /// verification hooks.
    pub fn server_conf(&self) -> ServerConf {
        let mut hooks = VerifyHooks::default();

        if !self.policy.allowed_targets.is_empty() {
            let allowed: Arc<HashSet<String>> =
                Arc::new(self.policy.allowed_targets.iter().cloned().collect());
            hooks.server = Some(VerifyHook::new(move |target| {
                let allowed = Arc::clone(&allowed);
                async move { allowed.contains(&target) }
            }));
        }

        if !self.policy.allowed_clients.is_empty() {
            let allowed: Arc<HashSet<String>> =
                Arc::new(self.policy.allowed_clients.iter().cloned().collect());
            hooks.tunnel_auth = Some(VerifyHook::new(move |name| {
                let allowed = Arc::clone(&allowed);
                async move { allowed.contains(&name) }
            }));
        }

        if !self.policy.paa_secret.is_empty() {
            let secret = self.policy.paa_secret.clone();
            hooks.tunnel_create = Some(VerifyHook::new(move |cookie| {
                let secret = secret.clone();
                async move { cookie == secret }
            }));
        }

        ServerConf {
            hooks,
            redirect: self.redirect,
            idle_timeout: self.tunnel.idle_timeout_minutes,
            smart_card_auth: self.tunnel.smart_card_auth,
            token_auth: self.tunnel.token_auth,
            enforce_paa_cookie: self.tunnel.enforce_paa_cookie,
            receive_buf: self.network.receive_buf,
            send_buf: self.network.send_buf,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
