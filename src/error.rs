//! Error taxonomy for startup and serving failures.
//!
//! Only two things are ever surfaced to callers: resource acquisition
//! failures from [`Supervisor::new`](crate::Supervisor::new) and bind
//! failures from [`Supervisor::serve`](crate::Supervisor::serve). Everything
//! that happens per request stays inside the pipeline, and shutdown-time
//! problems (drain window elapsed, stop called twice) are logged rather than
//! propagated.

use thiserror::Error;

use crate::net::listener::ListenerError;

/// Errors that can occur while building or running the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An externally configured resource could not be acquired at startup.
    #[error("resource '{name}' unavailable: {source}")]
    ResourceUnavailable {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The listener could not bind to the requested address.
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A running service's accept loop ended with a genuine I/O failure.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}
