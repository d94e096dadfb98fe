//! Long-running service abstraction.
//!
//! # Data Flow
//! ```text
//! Supervisor::run_service(service)
//!     → spawned task runs service.start()   (blocks until serving ends)
//! Supervisor::close
//!     → service.stop()                      (initiates shutdown, bounded wait)
//!     → start() returns, join barrier drops
//! ```
//!
//! # Design Decisions
//! - start() must always return once stop() has been issued; a service that
//!   abandons its task would wedge the supervisor's join barrier
//! - stop() may block for a bounded drain but never forever

pub mod http;

use async_trait::async_trait;

use crate::error::CoreError;

pub use http::HttpService;

/// A long-running unit the supervisor can run and stop.
///
/// Implementations are shared as `Arc<dyn Service>`: `start` runs on a
/// spawned task while `stop` is called from the shutdown path.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Stable identifier for logs.
    fn name(&self) -> &str;

    /// Run until told to stop or until an unrecoverable error occurs.
    /// Must return in both cases; never abandons its task.
    async fn start(&self) -> Result<(), CoreError>;

    /// Initiate shutdown for this instance and return once it is underway.
    /// May block up to a bounded drain window; must not hang forever.
    /// Expected to be called at most once; repeats are logged and ignored.
    async fn stop(&self);
}
