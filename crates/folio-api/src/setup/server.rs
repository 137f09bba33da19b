//! HTTP listener lifecycle

use anyhow::{Context, Result};
use axum::Router;
use folio_core::Config;
use std::future::Future;
use std::net::SocketAddr;

/// Which signal ended the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Address the API listens on (all interfaces, configured port).
pub fn bind_address(config: &Config) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], config.server_port()))
}

/// Bind and serve until SIGINT or SIGTERM.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = bind_address(config);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        backend = %config.storage_backend(),
        max_request_body_mb = config.max_request_body_bytes() / 1024 / 1024,
        picture_concurrency = config.picture_concurrency(),
        cleanup_grace_period_secs = config.cleanup_grace_period().as_secs(),
        "Upload API ready"
    );

    serve(listener, app, async {
        let signal = shutdown_signal().await;
        tracing::info!(?signal, "Draining in-flight uploads before exit");
    })
    .await
}

/// Serve `app` on `listener` until `shutdown` resolves. Requests already in
/// progress are allowed to finish.
pub async fn serve<F>(listener: tokio::net::TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// # Panics
/// Panics if a signal handler cannot be installed.
async fn shutdown_signal() -> ShutdownSignal {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => ShutdownSignal::Interrupt,
        _ = terminate => ShutdownSignal::Terminate,
    }
}
