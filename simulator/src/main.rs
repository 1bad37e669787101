use anyhow::Context;
use clap::Parser;
use fruitwheel_simulator::{files, Api, GameConfig};
use std::{net::SocketAddr, path::PathBuf};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the game WebSocket.
    #[arg(long, default_value_t = 8081)]
    ws_port: u16,

    /// Port for the static file server.
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Directory to serve (defaults to the directory containing this binary).
    #[arg(long)]
    root: Option<PathBuf>,

    /// YAML file with game settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn default_root() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate executable")?;
    Ok(exe
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".")))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    // Load game settings
    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let root = match args.root {
        Some(root) => root,
        None => default_root()?,
    };

    // Bind both fronts before serving either
    let ws_addr = format!("0.0.0.0:{}", args.ws_port);
    let ws_listener = tokio::net::TcpListener::bind(&ws_addr)
        .await
        .with_context(|| format!("failed to bind {ws_addr}"))?;
    let http_addr = format!("0.0.0.0:{}", args.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    let api = Api::new(config);
    let game = axum::serve(
        ws_listener,
        api.router()
            .into_make_service_with_connect_info::<SocketAddr>(),
    );
    let static_files = axum::serve(http_listener, files::router(root.clone()));
    info!(addr = %ws_addr, "Game WebSocket listening");
    info!(addr = %http_addr, root = %root.display(), "HTTP server listening");

    tokio::try_join!(
        async { game.await.context("game server error") },
        async { static_files.await.context("http server error") },
    )?;

    Ok(())
}
