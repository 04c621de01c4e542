//! The gateway protocol engine.
//!
//! Consumes control packets from a [`SessionTransport`], walks the
//! five-phase handshake, and on success splices the client to the dialed
//! backend.
//!
//! | packet            | required state    | next state      |
//! |-------------------|-------------------|-----------------|
//! | HANDSHAKE_REQUEST | Initial           | Handshake       |
//! | TUNNEL_CREATE     | Handshake         | TunnelCreate    |
//! | TUNNEL_AUTH       | TunnelCreate      | TunnelAuthorize |
//! | CHANNEL_CREATE    | TunnelAuthorize   | ChannelCreate   |
//! | DATA              | ≥ ChannelCreate   | Opened          |
//! | KEEPALIVE         | ≥ ChannelCreate   | unchanged       |
//! | CLOSE_CHANNEL     | Opened            | Closed          |
//!
//! Any other combination is fatal. Unknown packet types are logged and
//! skipped so newer clients keep working.

mod forward;

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServerConf;
use crate::error::GatewayError;
use crate::hooks::{allowed, VerifyHooks};
use crate::message::{
    ChannelCreate, ChannelResponse, HandshakeRequest, HandshakeResponse, TunnelAuth,
    TunnelAuthResponse, TunnelCreate, TunnelResponse,
};
use crate::network::SessionTransport;
use crate::packet::{Packet, PacketType, MAX_PAYLOAD_SIZE};
use crate::state::SessionState;

use forward::spawn_backend_pump;

/// How long a backend dial may take before the channel is refused.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(15);

/// One gateway session: the server half of the RDG control protocol plus
/// the client→backend relay direction.
pub struct Server<T> {
    transport: SessionTransport<T>,
    hooks: VerifyHooks,
    redirect_flags: u32,
    idle_timeout: u32,
    smart_card_auth: bool,
    token_auth: bool,
    enforce_paa_cookie: bool,
    relay_chunk: usize,
    state: SessionState,
    backend: Option<OwnedWriteHalf>,
    pump: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl<T> Server<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Bind a session to an established transport.
    pub fn new(transport: SessionTransport<T>, conf: &ServerConf) -> Self {
        Self {
            transport,
            hooks: conf.hooks.clone(),
            redirect_flags: conf.redirect.to_flags(),
            idle_timeout: conf.idle_timeout_minutes(),
            smart_card_auth: conf.smart_card_auth,
            token_auth: conf.token_auth,
            enforce_paa_cookie: conf.enforce_paa_cookie,
            relay_chunk: conf.send_buf.clamp(1, MAX_PAYLOAD_SIZE),
            state: SessionState::Initial,
            backend: None,
            pump: None,
            cancel: CancellationToken::new(),
        }
    }

    /// The session's current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Token that aborts this session when cancelled. Cancellation stops
    /// the engine read, closes both transport halves, and closes the
    /// backend socket; queued writes may be dropped.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the session until CLOSE_CHANNEL, cancellation, or a fatal
    /// error. Cleans up the backend socket and both transport halves on
    /// every exit path.
    pub async fn run(&mut self) -> Result<(), GatewayError> {
        let result = self.drive().await;
        if let Err(e) = &result {
            warn!("session failed in state {}: {e}", self.state);
        }
        self.shutdown().await;
        result
    }

    async fn drive(&mut self) -> Result<(), GatewayError> {
        loop {
            let packet = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("session cancelled");
                    return Ok(());
                }
                read = self.transport.read_message() => match read? {
                    Some(packet) => packet,
                    None => return Err(GatewayError::Disconnected),
                },
            };

            match packet.packet_type() {
                Ok(PacketType::HandshakeRequest) => self.on_handshake_request(&packet).await?,
                Ok(PacketType::TunnelCreate) => self.on_tunnel_create(&packet).await?,
                Ok(PacketType::TunnelAuth) => self.on_tunnel_auth(&packet).await?,
                Ok(PacketType::ChannelCreate) => self.on_channel_create(&packet).await?,
                Ok(PacketType::Data) => self.on_data(&packet).await?,
                Ok(PacketType::Keepalive) => self.on_keepalive()?,
                Ok(PacketType::CloseChannel) => {
                    self.on_close_channel()?;
                    return Ok(());
                }
                Ok(other) => {
                    // server-to-client types arriving inbound
                    warn!(size = packet.total_size(), "ignoring unexpected {other}");
                }
                Err(_) => {
                    warn!(
                        size = packet.total_size(),
                        "unknown packet type {:#06x}, skipping",
                        packet.type_code()
                    );
                    debug!(payload = ?packet.payload(), "unknown packet body");
                }
            }
        }
    }

    async fn shutdown(&mut self) {
        let aborted = self.cancel.is_cancelled();
        self.cancel.cancel();
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
        if let Some(mut backend) = self.backend.take() {
            let _ = backend.shutdown().await;
        }
        if aborted {
            self.transport.abort().await;
        } else {
            self.transport.close().await;
        }
        self.state = SessionState::Closed;
    }

    // ── Handlers ─────────────────────────────────────────────────

    async fn on_handshake_request(&mut self, packet: &Packet) -> Result<(), GatewayError> {
        self.state
            .require(SessionState::Initial, PacketType::HandshakeRequest)?;
        let req = HandshakeRequest::decode(packet.payload())?;
        debug!(
            major = req.major,
            minor = req.minor,
            version = req.client_version,
            extended_auth = req.extended_auth,
            "handshake request"
        );

        let resp =
            HandshakeResponse::new(req.major, req.minor, self.smart_card_auth, self.token_auth);
        self.transport.send(resp.encode()).await?;
        self.state = SessionState::Handshake;
        Ok(())
    }

    async fn on_tunnel_create(&mut self, packet: &Packet) -> Result<(), GatewayError> {
        self.state
            .require(SessionState::Handshake, PacketType::TunnelCreate)?;
        let req = TunnelCreate::decode(packet.payload())?;
        info!(caps = req.caps, "tunnel create");

        let cookie = req.paa_cookie.unwrap_or_default();
        if !allowed(&self.hooks.tunnel_create, &cookie).await {
            warn!("PAA cookie rejected");
            if self.enforce_paa_cookie {
                return Err(GatewayError::Denied {
                    subject: "PAA cookie",
                    detail: "cookie rejected".into(),
                });
            }
        }

        self.transport.send(TunnelResponse.encode()).await?;
        self.state = SessionState::TunnelCreate;
        Ok(())
    }

    async fn on_tunnel_auth(&mut self, packet: &Packet) -> Result<(), GatewayError> {
        self.state
            .require(SessionState::TunnelCreate, PacketType::TunnelAuth)?;
        let req = TunnelAuth::decode(packet.payload())?;
        info!(client = %req.client_name, "tunnel auth");

        if !allowed(&self.hooks.tunnel_auth, &req.client_name).await {
            warn!(client = %req.client_name, "client name rejected");
            return Err(GatewayError::Denied {
                subject: "client name",
                detail: req.client_name,
            });
        }

        let resp = TunnelAuthResponse {
            redirect_flags: self.redirect_flags,
            idle_timeout: self.idle_timeout,
        };
        self.transport.send(resp.encode()).await?;
        self.state = SessionState::TunnelAuthorize;
        Ok(())
    }

    async fn on_channel_create(&mut self, packet: &Packet) -> Result<(), GatewayError> {
        self.state
            .require(SessionState::TunnelAuthorize, PacketType::ChannelCreate)?;
        let req = ChannelCreate::decode(packet.payload())?;
        let target = req.target_addr();

        if !allowed(&self.hooks.server, &target).await {
            warn!(%target, "target rejected by policy");
            return Err(GatewayError::Denied {
                subject: "target server",
                detail: target,
            });
        }

        info!(%target, "establishing backend connection");
        let backend = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(()),
            result = dial_backend(&target) => result?,
        };
        info!(%target, "backend connection established");

        let (read_half, write_half) = backend.into_split();
        self.transport.send(ChannelResponse.encode()).await?;

        // The RDP server speaks first; its pump must be running before
        // any client data is relayed, or the connection can hang.
        let sink = self.transport.sink().ok_or(GatewayError::ChannelClosed)?;
        self.pump = Some(spawn_backend_pump(
            read_half,
            sink,
            self.relay_chunk,
            self.cancel.clone(),
        ));
        self.backend = Some(write_half);
        self.state = SessionState::ChannelCreate;
        Ok(())
    }

    async fn on_data(&mut self, packet: &Packet) -> Result<(), GatewayError> {
        self.state
            .require_at_least(SessionState::ChannelCreate, PacketType::Data)?;
        self.state = SessionState::Opened;
        if let Some(backend) = self.backend.as_mut() {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                result = backend.write_all(packet.payload()) => {
                    result.map_err(GatewayError::Relay)?;
                }
            }
        }
        Ok(())
    }

    fn on_keepalive(&self) -> Result<(), GatewayError> {
        // keepalives may arrive before bulk data flows, but never before
        // the channel exists; no echo is sent back
        self.state
            .require_at_least(SessionState::ChannelCreate, PacketType::Keepalive)
    }

    fn on_close_channel(&mut self) -> Result<(), GatewayError> {
        self.state
            .require(SessionState::Opened, PacketType::CloseChannel)?;
        info!("channel closed by client");
        self.state = SessionState::Closed;
        Ok(())
    }
}

/// Dial the target with the protocol's fixed connect deadline.
async fn dial_backend(addr: &str) -> Result<TcpStream, GatewayError> {
    match tokio::time::timeout(DIAL_TIMEOUT, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(GatewayError::Connect {
            addr: addr.to_string(),
            source: e,
        }),
        Err(_) => Err(GatewayError::ConnectTimeout {
            addr: addr.to_string(),
            timeout: DIAL_TIMEOUT,
        }),
    }
}
