//! HTTP service exposing `POST /validate`.
//!
//! One hyper HTTP/1 connection per accepted socket, each on its own task.
//! Shutdown stops accepting, then gives in-flight connections a grace period.

pub mod routes;

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use crate::core::orchestrator::ValidationOrchestrator;
use crate::error::{KeycheckError, Result};
use crate::storage::config::ResolvedConfig;

pub use routes::route;

/// How long in-flight requests may run after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// State shared by every connection.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub orchestrator: Arc<ValidationOrchestrator>,
    pub max_body_bytes: usize,
}

impl ServerState {
    #[must_use]
    pub const fn new(orchestrator: Arc<ValidationOrchestrator>, max_body_bytes: usize) -> Self {
        Self {
            orchestrator,
            max_body_bytes,
        }
    }
}

/// Bind to the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns error if the orchestrator cannot be built or the address cannot be
/// bound.
pub async fn run(config: &ResolvedConfig) -> Result<()> {
    let orchestrator = ValidationOrchestrator::from_config(config)?;
    let state = Arc::new(ServerState::new(
        Arc::new(orchestrator),
        config.max_body_bytes,
    ));

    let listener = TcpListener::bind(config.bind).await.map_err(|e| {
        KeycheckError::Config(format!("cannot bind {}: {e}", config.bind))
    })?;

    serve(listener, state, shutdown_signal()).await
}

/// Serve connections from `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns error if the listener's local address cannot be read.
pub async fn serve<F>(listener: TcpListener, state: Arc<ServerState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!(addr = %local, "Listening");

    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(error = %err, "Accept failed");
                        continue;
                    }
                };

                let state = Arc::clone(&state);
                let service = service_fn(move |request| {
                    let state = Arc::clone(&state);
                    async move { Ok::<_, Infallible>(route(&state, request).await) }
                });

                let connection = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service);
                let watched = graceful.watch(connection);

                tokio::spawn(async move {
                    if let Err(err) = watched.await {
                        tracing::debug!(%peer, error = %err, "Connection closed with error");
                    }
                });
            }
        }
    }

    drop(listener);
    tokio::select! {
        () = graceful.shutdown() => {
            tracing::info!("All connections closed");
        }
        () = tokio::time::sleep(SHUTDOWN_GRACE) => {
            tracing::warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Shutdown grace period elapsed");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Cannot listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
}
