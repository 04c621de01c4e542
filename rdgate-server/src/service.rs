//! Accept loop and per-session plumbing.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rdgate_core::{Server, ServerConf, SessionTransport};

use crate::config::GatewayConfig;

/// The top-level gateway service.
///
/// Owns the TCP listener and a shutdown token that aborts every active
/// session when cancelled.
pub struct GatewayService {
    config: GatewayConfig,
    shutdown: CancellationToken,
}

impl GatewayService {
    /// Create a service with the given config.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the accept loop and cancels active sessions.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run until the shutdown token is cancelled.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let conf = self.config.server_conf();
        let listener = TcpListener::bind(&self.config.network.listen).await?;
        info!("gateway listening on {}", listener.local_addr()?);

        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    info!(%peer, "gateway connection");
                    tokio::spawn(handle_session(
                        stream,
                        peer,
                        conf.clone(),
                        self.shutdown.clone(),
                    ));
                }
                Err(e) => warn!("accept error: {e}"),
            }
        }

        info!("gateway stopped");
        Ok(())
    }
}

/// Drive one client connection through the protocol engine.
async fn handle_session(
    stream: TcpStream,
    peer: SocketAddr,
    conf: ServerConf,
    shutdown: CancellationToken,
) {
    let _ = stream.set_nodelay(true);

    let transport = SessionTransport::with_capacity(stream, conf.receive_buf);
    let mut server = Server::new(transport, &conf);

    // propagate daemon shutdown into the session
    let cancel = server.cancellation_token();
    let watcher = tokio::spawn(async move {
        shutdown.cancelled().await;
        cancel.cancel();
    });

    match server.run().await {
        Ok(()) => info!(%peer, "session ended"),
        Err(e) => warn!(%peer, "session failed: {e}"),
    }
    watcher.abort();
}

// ── Tests ────────────────────────────────────────────────────────
