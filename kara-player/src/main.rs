//! Kara player - Main entry point
//!
//! Serves the control API, runs the playback supervisor and drives a VLC
//! process for the song on stage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kara_common::config::{resolve_songs_folder, SONGS_DIR_ENV};
use kara_player::api::{self, AppState};
use kara_player::config::TomlConfig;
use kara_player::library::{Library, SongLibrary};
use kara_player::player::{MediaPlayer, VlcSession};
use kara_player::Supervisor;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kara-player
#[derive(Parser, Debug)]
#[command(name = "kara-player")]
#[command(about = "Karaoke playback controller")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config)
    #[arg(short, long, env = "KARA_PORT")]
    port: Option<u16>,

    /// Folder holding the song files
    #[arg(short, long)]
    songs_dir: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "KARA_CONFIG")]
    config: Option<PathBuf>,

    /// VLC executable (overrides config)
    #[arg(long)]
    player_path: Option<PathBuf>,

    /// Port for VLC's HTTP control interface (overrides config)
    #[arg(long)]
    player_port: Option<u16>,

    /// Log filter when RUST_LOG is unset (overrides config)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so its level can seed the filter
    let mut config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("kara_player={level},kara_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = args.player_path {
        config.player.path = path;
    }
    if let Some(port) = args.player_port {
        config.player.http_port = port;
    }

    let songs_dir = resolve_songs_folder(
        args.songs_dir.as_deref(),
        SONGS_DIR_ENV,
        config.songs_dir.as_deref(),
    );
    info!("Starting kara-player on port {}", config.port);
    info!("Songs folder: {}", songs_dir.display());

    if !songs_dir.exists() {
        std::fs::create_dir_all(&songs_dir)
            .with_context(|| format!("Failed to create {}", songs_dir.display()))?;
        info!("Created songs folder");
    }

    let library = Arc::new(SongLibrary::new(songs_dir));
    if let Err(e) = library.refresh().await {
        warn!("Initial library scan failed: {}", e);
    }
    info!("Library holds {} songs", library.list_available().await.len());

    let player: Arc<dyn MediaPlayer> = Arc::new(VlcSession::new(config.player.clone()));
    let supervisor = Arc::new(Supervisor::new(
        Arc::clone(&player),
        library,
        &config.supervisor,
    ));

    let shutdown = CancellationToken::new();
    let supervisor_task = tokio::spawn(Arc::clone(&supervisor).run(shutdown.clone()));

    let app = api::create_router(AppState {
        supervisor: Arc::clone(&supervisor),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Err(e) = supervisor_task.await {
        warn!("Supervisor task ended abnormally: {}", e);
    }
    player.kill().await;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
