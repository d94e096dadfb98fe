//! TCP listener with cooperative cancellation.
//!
//! # Responsibilities
//! - Bind to the configured address (empty host defaults to port 80)
//! - Accept incoming TCP connections with keep-alive enabled
//! - Unblock a pending accept when `stop` is called from another task
//! - Distinguish "closed for shutdown" from genuine accept errors

use std::net::SocketAddr;
use std::sync::Mutex;
use std::task::Poll;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
    /// The listener was stopped; accept will never succeed again.
    Closed,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
            ListenerError::Closed => write!(f, "Listener has been stopped"),
        }
    }
}

impl std::error::Error for ListenerError {}

/// A TCP listener whose blocking accept can be interrupted from another task.
///
/// `stop` flips a cancellation token and releases the OS socket: a pending
/// `accept` observes the token and fails with [`ListenerError::Closed`]
/// instead of hanging, and later connection attempts are refused by the OS.
/// `stop` is idempotent; the socket is taken out of its slot on the first
/// call, so it can never be double-closed.
pub struct CancellableListener {
    /// The underlying TCP listener; emptied by `stop`.
    inner: Mutex<Option<TcpListener>>,
    /// Cancellation token flipped by `stop`.
    cancelled: CancellationToken,
    /// Address captured at bind time (stable across `stop`).
    local_addr: SocketAddr,
    /// Keep-alive interval applied to accepted streams.
    keep_alive: Duration,
}

impl CancellableListener {
    /// Bind to `addr` ("host:port"; an empty host or empty string defaults
    /// to the standard HTTP port on all interfaces).
    pub async fn bind(addr: &str, keep_alive: Duration) -> Result<Self, ListenerError> {
        let addr = normalize_address(addr);

        let listener = TcpListener::bind(&addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            keep_alive_secs = keep_alive.as_secs(),
            "Listener bound"
        );

        Ok(Self {
            inner: Mutex::new(Some(listener)),
            cancelled: CancellationToken::new(),
            local_addr,
            keep_alive,
        })
    }

    /// Accept the next connection with keep-alive enabled.
    ///
    /// Fails with [`ListenerError::Closed`] if `stop` has been called, even
    /// when the call was already blocked inside the accept.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        if self.cancelled.is_cancelled() {
            return Err(ListenerError::Closed);
        }

        tokio::select! {
            _ = self.cancelled.cancelled() => Err(ListenerError::Closed),
            accepted = std::future::poll_fn(|cx| self.poll_accept(cx)) => {
                match accepted {
                    Ok((stream, peer_addr)) => {
                        self.apply_keep_alive(&stream);

                        tracing::debug!(peer_addr = %peer_addr, "Connection accepted");

                        Ok((stream, peer_addr))
                    }
                    // An error that races with stop is just the shutdown.
                    Err(_) if self.cancelled.is_cancelled() => Err(ListenerError::Closed),
                    Err(error) => Err(ListenerError::Accept(error)),
                }
            }
        }
    }

    /// Stop accepting and release the OS socket. Idempotent; never fails.
    pub fn stop(&self) {
        if !self.cancelled.is_cancelled() {
            self.cancelled.cancel();
            drop(self.inner.lock().expect("listener lock poisoned").take());
            tracing::debug!(address = %self.local_addr, "Listener stopped");
        }
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.cancelled.is_cancelled()
    }

    /// The address this listener was bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The lock is held only for the duration of one poll, never across a
    /// suspension point.
    fn poll_accept(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<std::io::Result<(TcpStream, SocketAddr)>> {
        let guard = self.inner.lock().expect("listener lock poisoned");
        match guard.as_ref() {
            Some(listener) => listener.poll_accept(cx),
            None => Poll::Ready(Err(std::io::Error::other("listener closed"))),
        }
    }

    /// Keep-alive failures are not worth rejecting the connection over.
    fn apply_keep_alive(&self, stream: &TcpStream) {
        let keepalive = TcpKeepalive::new().with_time(self.keep_alive);
        if let Err(error) = SockRef::from(stream).set_tcp_keepalive(&keepalive) {
            tracing::debug!(%error, "Failed to enable TCP keep-alive");
        }
    }
}

/// Expand the "host:port" shorthand forms the supervisor accepts.
fn normalize_address(addr: &str) -> String {
    if addr.is_empty() {
        return "0.0.0.0:80".to_string();
    }
    if let Some(port) = addr.strip_prefix(':') {
        return format!("0.0.0.0:{}", port);
    }
    addr.to_string()
}
