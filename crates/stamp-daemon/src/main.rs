//! stampd: the loyalty ledger daemon.
//!
//! Single OS process running a Tokio async runtime. Front ends and scanners
//! talk to the daemon via JSON-RPC over a Unix socket.

mod commands;
mod config;
mod events;
mod rpc;

use std::sync::Arc;

use stamp_ledger::Ledger;
use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// The ledger service. Owns the database connection.
    pub ledger: Arc<Ledger>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing committed events to subscribers.
    pub event_bus: EventBus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config (the log level lives in it)
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("stamp={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "stampd starting");

    // Ensure data directory exists
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Create event bus
    let event_bus = EventBus::new(config.rpc.event_buffer);

    // 4. Open the ledger (migrates the database)
    let db_path = config.db_path();
    let ledger = Ledger::open(&db_path, config.ledger_settings())?
        .with_sink(Arc::new(event_bus.clone()));
    info!(db = ?db_path, "ledger database open");

    // 5. Build daemon state
    let socket_path = config.socket_path();
    let state = Arc::new(DaemonState {
        ledger: Arc::new(ledger),
        config,
        event_bus,
    });

    // 6. Start IPC server
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    // 7. Run the RPC server until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!(
        events_published = state.event_bus.sequence(),
        default_stamps_required = state.config.ledger.default_stamps_required,
        "daemon shutting down gracefully"
    );

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    // Dropping the last state handle closes the database.
    drop(state);
    info!("Daemon stopped");
    Ok(())
}
