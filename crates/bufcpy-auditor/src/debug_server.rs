// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP status endpoint served while a sweep runs (`--debug`).
//!
//! The server runs on its own thread with a single-threaded tokio runtime so
//! it never competes with the benchmark pools for workers.

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use axum::{extract::State, routing::get, Json, Router};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::progress::{Progress, Status};
use crate::report::RoundSummary;

/// Failure to start the debug server.
#[derive(Debug, Error)]
pub enum DebugServerError {
    /// The listen address is unavailable.
    #[error("could not bind debug server to {addr}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// Runtime or thread setup failed.
    #[error("debug server setup failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Running server; stops when dropped.
pub struct DebugServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DebugServer {
    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for DebugServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Routes: `GET /debug/status`, `GET /debug/rounds`.
pub fn router(progress: Progress) -> Router {
    Router::new()
        .route("/debug/status", get(status))
        .route("/debug/rounds", get(rounds))
        .with_state(progress)
}

async fn status(State(progress): State<Progress>) -> Json<Status> {
    Json(progress.status())
}

async fn rounds(State(progress): State<Progress>) -> Json<Vec<RoundSummary>> {
    Json(progress.rounds())
}

/// Binds `addr` and serves [`router`] on a background thread.
pub fn spawn(addr: SocketAddr, progress: Progress) -> Result<DebugServer, DebugServerError> {
    let listener =
        std::net::TcpListener::bind(addr).map_err(|source| DebugServerError::Bind { addr, source })?;
    listener.set_nonblocking(true)?;
    let local = listener.local_addr()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (tx, rx) = oneshot::channel::<()>();

    let handle = thread::Builder::new()
        .name("bufcpy-debug".into())
        .spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(err) => {
                        error!(%err, "debug server failed to start");
                        return;
                    }
                };
                let shutdown = async move {
                    let _ = rx.await;
                };
                if let Err(err) = axum::serve(listener, router(progress))
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    error!(%err, "debug server stopped");
                }
            });
        })?;

    info!("debug status at http://{local}/debug/status");
    Ok(DebugServer {
        addr: local,
        shutdown: Some(tx),
        handle: Some(handle),
    })
}
