mod app;
mod bus;
mod config;
mod console;
mod controller;
mod descriptor;
mod transport;

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "worldstate", about = "Edit a robot's map and initial pose and publish them")]
struct Cli {
    /// Map descriptor (YAML) to load at startup instead of the blank arena.
    #[arg(long, env = "WORLDSTATE_MAP")]
    map: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), app::AppError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    let cli = Cli::parse();
    let config = config::AppConfig::from_env();
    info!(
        arena_width = config.arena.width,
        arena_height = config.arena.height,
        resolution = config.arena.resolution,
        robot_diameter = config.robot_diameter,
        "worldstate starting"
    );

    let bus = bus::Bus::new(config.queue_capacity);
    let stdin = BufReader::new(tokio::io::stdin());
    app::run(config, bus, cli.map, stdin, shutdown_signal()).await
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
