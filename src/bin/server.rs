//! EmberKV Server Binary
//!
//! Replays the AOF and starts the TCP server.

use std::sync::Arc;

use clap::Parser;
use emberkv::config::{AofSyncStrategy, ConnectionPolicy, ExpirePolicy};
use emberkv::network::Server;
use emberkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// EmberKV Server
#[derive(Parser, Debug)]
#[command(name = "emberkv-server")]
#[command(about = "In-memory key-value store with an append-only log")]
#[command(version)]
struct Args {
    /// Data directory (holds appendonly.aof)
    #[arg(short, long, default_value = "./emberkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// `reuse` frees a slot when a client leaves; `budget` serves
    /// max-connections clients in total and then stops accepting
    #[arg(long, default_value = "reuse")]
    connection_policy: ConnectionPolicy,

    /// AOF fsync policy: `always`, `every:<n>` or `no`
    #[arg(long, default_value = "always")]
    sync: AofSyncStrategy,

    /// Disable the append-only log (nothing survives a restart)
    #[arg(long)]
    no_aof: bool,

    /// Make EXPIRE on a missing key a no-op instead of creating an empty key
    #[arg(long)]
    expire_ignores_missing: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emberkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("EmberKV Server v{}", emberkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let expire_policy = if args.expire_ignores_missing {
        ExpirePolicy::IgnoreMissing
    } else {
        ExpirePolicy::Materialize
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .connection_policy(args.connection_policy)
        .aof_enabled(!args.no_aof)
        .aof_sync_strategy(args.sync)
        .expire_policy(expire_policy)
        .build();

    // Open engine (replays the AOF before any client is accepted)
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Engine initialized ({} records replayed)",
        engine.replay_stats().records
    );

    let server = match Server::bind(config, Arc::clone(&engine)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // SIGINT/SIGTERM stop the accept loop so the AOF is synced on the way out
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Shutdown signal received");
        shutdown.shutdown();
    }) {
        tracing::error!("Failed to install signal handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = engine.sync() {
        tracing::error!("Failed to sync AOF: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
