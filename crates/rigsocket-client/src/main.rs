//! rigsocket-client: entry point.
//!
//! Connects a rig to the coordination service, pushes device status every
//! interval, and logs balance, version, and pricing notifications as they
//! arrive.  The binary ships with an empty device inventory; an agent that
//! embeds the library feeds real readings through
//! [`StaticDeviceInventory::set_devices`].
//!
//! # Usage
//!
//! ```text
//! rigsocket-client [OPTIONS]
//!
//! Options:
//!   --config <PATH>            Config file [default: platform config dir]
//!   --address <URL>            Service WebSocket URL
//!   --btc <ADDRESS>            Payout address
//!   --worker <NAME>            Worker (rig) name
//!   --status-interval <SECS>   Seconds between status pushes
//!   --write-default-config     Write a default config file and exit
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                    | Description                      |
//! |-----------------------------|----------------------------------|
//! | `RIGSOCKET_CONFIG`          | Config file path                 |
//! | `RIGSOCKET_ADDRESS`         | Service WebSocket URL            |
//! | `RIGSOCKET_BTC`             | Payout address                   |
//! | `RIGSOCKET_WORKER`          | Worker name                      |
//! | `RIGSOCKET_STATUS_INTERVAL` | Seconds between status pushes    |
//! | `RUST_LOG`                  | Log filter (overrides `[logging]`) |
//!
//! CLI args take precedence over environment variables, which take
//! precedence over the config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rigsocket_client::infrastructure::devices::{StaticDeviceInventory, StaticMinerRegistry};
use rigsocket_client::infrastructure::network::WsTransport;
use rigsocket_client::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, save_config_to, ClientConfig,
};
use rigsocket_client::{ClientOptions, StatsClient};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Stats socket client for a mining rig.
#[derive(Debug, Parser)]
#[command(
    name = "rigsocket-client",
    about = "Self-healing stats connection between a mining rig and its coordination service",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "RIGSOCKET_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket URL of the coordination service.
    #[arg(long, env = "RIGSOCKET_ADDRESS")]
    address: Option<String>,

    /// Bitcoin payout address.
    #[arg(long, env = "RIGSOCKET_BTC")]
    btc: Option<String>,

    /// Worker (rig) name, up to 15 alphanumeric characters.
    #[arg(long, env = "RIGSOCKET_WORKER")]
    worker: Option<String>,

    /// Seconds between status pushes.
    #[arg(long, env = "RIGSOCKET_STATUS_INTERVAL")]
    status_interval: Option<u64>,

    /// Write a default config file to the config path and exit.
    #[arg(long)]
    write_default_config: bool,
}

impl Cli {
    /// Config file location: `--config` or the platform default.
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config dir"),
        }
    }

    /// Overlays the command-line values on top of `config`.
    fn apply_to(self, mut config: ClientConfig) -> ClientConfig {
        if let Some(address) = self.address {
            config.connection.address = address;
        }
        if let Some(secs) = self.status_interval {
            config.connection.status_interval_secs = secs;
        }
        if self.btc.is_some() {
            config.credentials.btc = self.btc;
        }
        if self.worker.is_some() {
            config.credentials.worker = self.worker;
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.write_default_config {
        let config_path = cli.config_path()?;
        save_config_to(&ClientConfig::default(), &config_path)
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("wrote default config to {}", config_path.display());
        return Ok(());
    }

    let file_config = match &cli.config {
        Some(path) => {
            load_config_from(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => load_config().context("loading config from the platform config dir")?,
    };
    let config = cli.apply_to(file_config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the `[logging] level` from the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "rigsocket-client starting: address={}, status every {:?}",
        config.connection.address,
        config.connection.status_interval()
    );

    let client = Arc::new(StatsClient::new(
        Arc::new(WsTransport::new()),
        Arc::new(StaticDeviceInventory::default()),
        Arc::new(StaticMinerRegistry::new()),
        ClientOptions {
            status_interval: config.connection.status_interval(),
            reconnect_delay: config.connection.reconnect_delay(),
            connect_timeout: config.connection.connect_timeout(),
        },
    ));
    subscribe_log_lines(&client);

    if let Some(btc) = config.credentials.btc.clone() {
        let worker = config.credentials.worker.clone().unwrap_or_default();
        // The service forgets the rig's identity with each connection.
        let weak = Arc::downgrade(&client);
        client.events().on_connection_established(move |_| {
            if let Some(client) = weak.upgrade() {
                client.set_credentials(&btc, &worker);
            }
        });
    }

    client.start(&config.connection.address);

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => warn!("failed to listen for Ctrl+C signal: {e}; shutting down"),
    }
    client.shutdown().await;

    info!("rigsocket-client stopped");
    Ok(())
}

fn subscribe_log_lines(client: &StatsClient) {
    let events = client.events();
    events.on_balance_update(|balance| info!("balance: {balance} BTC"));
    events.on_version_update(|version| info!("latest client version: {version}"));
    events.on_version_burn(|message| warn!("this client version is retired: {message}"));
    events
        .sma_updated
        .subscribe(|rates| info!("pay rates updated for {} algorithm(s)", rates.len()));
    events.exchange_rates_updated.subscribe(|rates| match rates.usd_btc_rate {
        Some(usd) => info!("BTC/USD rate: {usd}"),
        None => info!("exchange rates updated"),
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
