//! remplay - Main entry point
//!
//! Startup order:
//! 1. Tracing, build identification, configuration (fails without a secret)
//! 2. Bind the HTTP listener
//! 3. Library scan and tunnel publishing, concurrently
//! 4. Serve until Ctrl+C / SIGTERM, then stop any running player

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use remplay::api::{build_router, server, AppContext};
use remplay::config::{Args, Config};
use remplay::library::{build_index, LibraryIndex};
use remplay::player::PlayerController;
use remplay::tunnel::{NgrokTunnel, PublicTunnel, TunnelPublisher};
use remplay::volume::VolumeController;
use remplay_common::{ProcessRunner, SystemRunner};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remplay=debug,remplay_common=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting remplay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = Config::load(Args::parse()).context("Failed to load configuration")?;
    info!("Source path: {}", config.source_path);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner::new());

    let (library, tunnel) = tokio::join!(
        scan_library(runner.as_ref(), &config),
        publish_tunnel(&config)
    );
    let library = Arc::new(library);

    let player = PlayerController::new(
        Arc::clone(&library),
        Arc::clone(&runner),
        config.commands.player.clone(),
    );
    let volume = Arc::new(VolumeController::new(
        Arc::clone(&runner),
        config.commands.volume.clone(),
    ));

    let ctx = AppContext::new(library, player.clone(), volume, config.secret.clone());
    let app = build_router(ctx);

    server::run(listener, app, shutdown_signal())
        .await
        .context("Server error")?;

    player.stop();
    // Keeps the tunnel agent alive until here
    drop(tunnel);

    info!("Server shutdown complete");
    Ok(())
}

/// Index the source folder; a failed scan leaves the library empty
async fn scan_library(runner: &dyn ProcessRunner, config: &Config) -> LibraryIndex {
    match build_index(runner, &config.commands.list, &config.source_path).await {
        Ok(index) => {
            if index.is_empty() {
                warn!("No audio files found under {}", index.root());
            }
            index
        }
        Err(e) => {
            error!("Library scan failed: {}", e);
            LibraryIndex::empty(&config.source_path)
        }
    }
}

/// Publish the HTTP port; failures leave the server local-only
async fn publish_tunnel(config: &Config) -> Option<PublicTunnel> {
    if !config.tunnel_enabled {
        info!("Tunnel disabled, serving locally only");
        return None;
    }

    let publisher = NgrokTunnel::new(config.commands.tunnel.clone());
    match publisher.connect(config.port).await {
        Ok(tunnel) => {
            info!("Public URL: {}", tunnel.public_url);
            Some(tunnel)
        }
        Err(e) => {
            warn!("Tunnel unavailable, serving locally only: {}", e);
            None
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
