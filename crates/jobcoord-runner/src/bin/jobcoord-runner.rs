//! # Task Runner Server
//!
//! Hosts the task runner engine behind its HTTP API with the built-in
//! Echo and Wait procedures registered.
//!
//! ```bash
//! jobcoord-runner --addr 127.0.0.1:8000 --max-task-num 10
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use jobcoord_runner::engine::{TaskRunner, TaskRunnerConfig};
use jobcoord_runner::{tasks, web};
use jobcoord_shared::logging;

#[derive(Parser)]
#[command(name = "jobcoord-runner", about = "jobcoord task runner node")]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Maximum number of concurrently running tasks.
    #[arg(long = "max-task-num", default_value_t = 10)]
    max_task_num: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let args = Args::parse();

    let runner = Arc::new(TaskRunner::new(TaskRunnerConfig {
        max_tasks: args.max_task_num,
        handler: None,
    }));
    tasks::register_builtin(runner.registry())?;

    let shutdown = CancellationToken::new();
    let collector = {
        let runner = runner.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { runner.run(shutdown).await })
    };

    let app = web::router(runner);
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, max_tasks = args.max_task_num, "task runner listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    collector.await?;
    info!("task runner shutdown complete");

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
