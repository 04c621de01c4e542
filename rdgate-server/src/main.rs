//! rdgate-server — entry point.
//!
//! ```text
//! rdgate-server                   Run with rdgate.toml (or defaults)
//! rdgate-server --config <path>   Load a custom config TOML
//! rdgate-server --listen <addr>   Override the listen address
//! rdgate-server --gen-config      Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rdgate_server::config::GatewayConfig;
use rdgate_server::service::GatewayService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rdgate-server", about = "Remote Desktop Gateway daemon")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rdgate.toml")]
    config: PathBuf,

    /// Override the configured listen address.
    #[arg(short, long)]
    listen: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&GatewayConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let mut config = GatewayConfig::load(&cli.config);
    if let Some(listen) = cli.listen {
        config.network.listen = listen;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rdgate-server v{}", env!("CARGO_PKG_VERSION"));
    info!("listen address: {}", config.network.listen);
    info!("idle timeout: {} min", config.tunnel.idle_timeout_minutes);
    info!(
        "auth: smart-card={} token={}",
        config.tunnel.smart_card_auth, config.tunnel.token_auth
    );
    if !config.policy.allowed_targets.is_empty() {
        info!("target allow-list: {} entries", config.policy.allowed_targets.len());
    }

    let service = GatewayService::new(config);
    let shutdown = service.shutdown_token();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown signal received");
        shutdown.cancel();
    });

    service.run().await
}
