// src/server/mod.rs

//! HTTP transport for the run service.
//!
//! - [`api`] maps routes onto [`RunService`](crate::service::RunService)
//!   operations; `Status` is streamed as Server-Sent Events.
//! - This module binds the listener and drives `axum::serve`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::context::ExecutionContext;
use crate::errors::{Result, RunvisorError};
use crate::service::RunService;

pub mod api;

pub use api::router;

/// Build the service for a server config and context.
pub fn build_service(config: &ServerConfig, context: Arc<dyn ExecutionContext>) -> RunService {
    RunService::new(context).with_poll_interval(config.poll_interval())
}

/// Bind the listening socket, wrapping failures as startup errors.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let addr = config.socket_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| RunvisorError::startup(format!("could not bind {addr}"), e))
}

/// Serve until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    service: RunService,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "runvisor server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(%addr, "runvisor server stopped");
    Ok(())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, context: Arc<dyn ExecutionContext>) -> Result<()> {
    let listener = bind(config).await?;
    let service = build_service(config, context);

    serve_with_shutdown(listener, service, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    })
    .await
}

/// A server running in the background, e.g. for tests or embedding.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for [`RunvisorClient`](crate::client::RunvisorClient).
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for open streams to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|e| RunvisorError::Other(anyhow::Error::new(e)))?
    }
}

/// Bind per `config` and serve `service` on a background task.
pub async fn spawn_server(config: &ServerConfig, service: RunService) -> Result<ServerHandle> {
    let listener = bind(config).await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();

    let task = tokio::spawn(serve_with_shutdown(listener, service, async move {
        let _ = rx.await;
    }));

    Ok(ServerHandle {
        addr,
        shutdown: Some(tx),
        task,
    })
}
