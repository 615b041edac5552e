//! TideKV - An In-Memory, Multi-Database Key-Value Store
//!
//! This is the main entry point for the TideKV server.
//! It sets up the catalog, then serves TCP clients or the local console.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tidekv::commands::CommandHandler;
use tidekv::connection::{handle_connection, run_console, ConnectionStats};
use tidekv::storage::Catalog;
use tidekv::Config;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// TideKV Server
#[derive(Parser, Debug)]
#[command(name = "tidekv")]
#[command(about = "In-memory multi-database key-value store with per-key TTL")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = tidekv::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = tidekv::DEFAULT_PORT)]
    port: u16,

    /// Milliseconds between expiry sweeps
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    reclaim_interval_ms: u64,

    /// Run a local console on stdin/stdout instead of the TCP server
    #[arg(short, long)]
    interactive: bool,
}

fn print_banner(config: &Config) {
    println!(
        r#"
TideKV v{} - In-Memory Key-Value Store
──────────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        tidekv::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::builder()
        .host(args.host)
        .port(args.port)
        .reclaim_interval(Duration::from_millis(args.reclaim_interval_ms))
        .build();

    // The catalog is shared across all sessions
    let catalog = Arc::new(Catalog::new(config.reclaimer.clone()));
    info!(
        reclaim_interval_ms = config.reclaimer.interval.as_millis(),
        "Catalog initialized"
    );

    let stats = Arc::new(ConnectionStats::new());

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    if args.interactive {
        tokio::select! {
            result = run_console(Arc::clone(&catalog), stats) => result?,
            _ = shutdown => {}
        }
    } else {
        let listener = TcpListener::bind(config.bind_address()).await?;
        print_banner(&config);
        info!("Listening on {}", config.bind_address());

        tokio::select! {
            _ = accept_loop(listener, Arc::clone(&catalog), stats) => {}
            _ = shutdown => {}
        }
    }

    catalog.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(listener: TcpListener, catalog: Arc<Catalog>, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                // Each connection gets its own session state
                let handler = CommandHandler::new(Arc::clone(&catalog));
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
