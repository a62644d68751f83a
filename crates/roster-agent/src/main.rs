//! # roster-agent
//!
//! Roster server binary. Loads settings, wires the auth gate and starts the
//! HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use roster_auth::{AuthGate, InMemoryIdentityStore, JwtVerifier, PrincipalRecord};
use roster_server::{RosterServer, ServerConfig};
use roster_settings::{RosterSettings, ServerSettings};

/// Roster attendance broadcast server.
#[derive(Parser, Debug)]
#[command(name = "roster-agent", about = "Roster attendance broadcast server")]
struct Cli {
    /// Settings file (defaults to `~/.roster/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    fn server_config(&self, settings: &ServerSettings) -> ServerConfig {
        let mut config = ServerConfig::from(settings);
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

fn build_gate(settings: &RosterSettings) -> Result<AuthGate> {
    if settings.auth.jwt_secret.is_empty() {
        bail!("auth.jwt_secret is not set (ROSTER_AUTH__JWT_SECRET)");
    }
    let store = InMemoryIdentityStore::new(settings.auth.principals.iter().map(|p| {
        PrincipalRecord {
            name: p.name.clone(),
            enabled: p.enabled,
        }
    }));
    if store.is_empty() {
        tracing::warn!("no principals configured, every handshake will be refused");
    }
    let verifier = JwtVerifier::new(settings.auth.jwt_secret.as_bytes());
    Ok(AuthGate::new(Arc::new(verifier), Arc::new(store)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .config
        .clone()
        .unwrap_or_else(roster_settings::settings_path);
    let settings = roster_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    roster_core::init_subscriber(&settings.logging.level, settings.logging.format);

    let gate = build_gate(&settings)?;
    let config = args.server_config(&settings.server);

    let metrics = match roster_server::metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "metrics recorder unavailable, /metrics disabled");
            None
        }
    };

    let server = RosterServer::new(config, gate, metrics);
    let (addr, handle) = server
        .listen()
        .await
        .context("Failed to bind server")?;
    tracing::info!("Roster listening on ws://{addr}/ws");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server
        .shutdown()
        .graceful_shutdown(server.hub(), vec![handle], Some(Duration::from_secs(10)))
        .await;
    tracing::info!("Shutdown complete");
    Ok(())
}
