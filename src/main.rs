use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordduel::{config::ServerConfig, error::ServerError, server};

#[derive(Parser, Debug)]
#[command(author, version, about = "Three-player word duel server", long_about = None)]
struct Args {
    /// TCP port to listen on
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordduel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting wordduel...");

    let config = ServerConfig::from_env();

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(source) => {
            tracing::error!("{}", ServerError::Bind { addr, source });
            return ExitCode::FAILURE;
        }
    };

    let handle = match server::start(config, listener).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }

    handle.shutdown().await;
    ExitCode::SUCCESS
}
