//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, keep-alive, cooperative cancel)
//!     → inflight.rs (per-request gauge for drain decisions)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Stopping a listener is a token flip, so it is idempotent and can never
//!   double-close the socket
//! - A pending accept is unblocked by the cancel, not abandoned
//! - In-flight accounting is RAII so panicking requests cannot leak a count

pub mod inflight;
pub mod listener;

pub use inflight::{InflightCounter, InflightGuard};
pub use listener::{CancellableListener, ListenerError};
