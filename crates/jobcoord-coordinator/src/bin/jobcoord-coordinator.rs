//! # Coordinator Server
//!
//! Hosts the coordinator engine behind its HTTP API and runs the runner
//! liveness sweep for the process lifetime.
//!
//! ```bash
//! jobcoord-coordinator --addr 127.0.0.1:9000
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use jobcoord_coordinator::engine::{Coordinator, CoordinatorConfig};
use jobcoord_coordinator::web;
use jobcoord_shared::logging;

#[derive(Parser)]
#[command(name = "jobcoord-coordinator", about = "jobcoord job coordinator")]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:9000")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let args = Args::parse();

    let coordinator = Arc::new(Coordinator::new(CoordinatorConfig::default()));

    let shutdown = CancellationToken::new();
    let sweeper = {
        let coordinator = coordinator.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { coordinator.run(shutdown).await })
    };

    let app = web::router(coordinator);
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "coordinator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    sweeper.await?;
    info!("coordinator shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (ctrl-c or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}
