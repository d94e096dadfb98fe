//! HTTP service: accept loop, per-connection serving, bounded drain.
//!
//! # Responsibilities
//! - Serve the shared router on a cancellable listener
//! - Spawn one task per accepted connection (HTTP/1.1)
//! - On stop: signal the listener waiter, then drain in-flight requests
//!   within the configured window
//!
//! # Design Decisions
//! - The done signal is a one-shot channel whose sender is taken on first
//!   use; a second stop cannot re-signal it
//! - ListenerError::Closed ends the accept loop silently (expected during
//!   shutdown); any other accept error terminates the service and is logged
//! - The drain wait is bounded: liveness beats perfect graceful completion

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::sync::oneshot;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::schema::CoreConfig;
use crate::error::CoreError;
use crate::http::pipeline::RequestPipeline;
use crate::net::inflight::InflightCounter;
use crate::net::listener::{CancellableListener, ListenerError};
use crate::service::Service;

/// A [`Service`] serving HTTP on one listener.
pub struct HttpService {
    name: String,
    addr: SocketAddr,
    listener: Arc<CancellableListener>,
    pipeline: RequestPipeline,
    inflight: InflightCounter,
    done_tx: Mutex<Option<oneshot::Sender<()>>>,
    done_rx: Mutex<Option<oneshot::Receiver<()>>>,
    drain_timeout: Duration,
    drain_poll: Duration,
}

impl HttpService {
    /// Build a service around an already-bound listener. Binding happens in
    /// [`Supervisor::serve`](crate::Supervisor::serve) so bind failures stay
    /// synchronous.
    pub fn new(listener: CancellableListener, router: Router, config: &CoreConfig) -> Self {
        let addr = listener.local_addr();
        let inflight = InflightCounter::new();

        let router = router
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(TraceLayer::new_for_http());

        let pipeline = RequestPipeline::new(
            router,
            inflight.clone(),
            Arc::new(config.locale.clone()),
        );

        let (done_tx, done_rx) = oneshot::channel();

        Self {
            name: format!("http:{}", addr),
            addr,
            listener: Arc::new(listener),
            pipeline,
            inflight,
            done_tx: Mutex::new(Some(done_tx)),
            done_rx: Mutex::new(Some(done_rx)),
            drain_timeout: config.shutdown.drain_timeout(),
            drain_poll: config.shutdown.drain_poll_interval(),
        }
    }

    /// Address the underlying listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Requests currently inside the handler chain.
    pub fn in_flight(&self) -> u64 {
        self.inflight.count()
    }
}

#[async_trait]
impl Service for HttpService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), CoreError> {
        let Some(done) = self.done_rx.lock().expect("service lock poisoned").take() else {
            tracing::warn!(service = %self.name, "Start called more than once");
            return Ok(());
        };

        // Stop waiter: the done signal (or the service being dropped
        // unstopped) cancels the listener and unblocks the accept below.
        let listener = Arc::clone(&self.listener);
        tokio::spawn(async move {
            let _ = done.await;
            listener.stop();
        });

        tracing::info!(service = %self.name, address = %self.addr, "HTTP service running");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let io = TokioIo::new(stream);
                    let connection_service = self.pipeline.for_peer(peer_addr);
                    tokio::spawn(async move {
                        if let Err(error) = http1::Builder::new()
                            .serve_connection(io, connection_service)
                            .await
                        {
                            tracing::debug!(%error, "Connection ended with error");
                        }
                    });
                }
                Err(ListenerError::Closed) => {
                    tracing::info!(service = %self.name, "HTTP service stopped");
                    return Ok(());
                }
                Err(error) => {
                    tracing::error!(service = %self.name, %error, "Accept failed; service terminating");
                    return Err(CoreError::Listener(error));
                }
            }
        }
    }

    async fn stop(&self) {
        let Some(done) = self.done_tx.lock().expect("service lock poisoned").take() else {
            tracing::warn!(service = %self.name, "Stop called more than once");
            return;
        };

        // The waiter task turns this into a listener cancel.
        let _ = done.send(());

        let in_flight = self.inflight.count();
        if in_flight > 0 {
            tracing::info!(
                service = %self.name,
                in_flight,
                "Draining in-flight requests"
            );
        }

        let drained =
            tokio::time::timeout(self.drain_timeout, self.inflight.drained(self.drain_poll)).await;

        match drained {
            Ok(()) => {
                tracing::debug!(service = %self.name, "Drain complete");
            }
            Err(_) => {
                tracing::warn!(
                    service = %self.name,
                    in_flight = self.inflight.count(),
                    drain_timeout_secs = self.drain_timeout.as_secs(),
                    "Drain window elapsed; abandoning wait"
                );
            }
        }
    }
}
