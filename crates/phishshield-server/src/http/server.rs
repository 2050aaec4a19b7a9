//! HTTP server loop.

use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use super::handlers::AppState;
use super::routes::create_router;

/// Axum server for the classification API.
pub struct HttpServer {
    listen: SocketAddr,
    cors_enabled: bool,
    state: AppState,
}

impl HttpServer {
    pub fn new(listen: SocketAddr, cors_enabled: bool, state: AppState) -> Self {
        Self {
            listen,
            cors_enabled,
            state,
        }
    }

    /// Bind the listen address and serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.listen)
            .await
            .with_context(|| format!("failed to bind {}", self.listen))?;
        self.run_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn run_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.state, self.cors_enabled);
        let addr = listener.local_addr().context("listener has no address")?;
        info!("PhishShield API listening on http://{addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
